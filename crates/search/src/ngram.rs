/// Contiguous token span of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NGram {
    pub text: String,
    pub start: usize,
    pub len: usize,
}

/// Every contiguous span of `1..=min(max_span, tokens.len())` tokens, longest
/// spans first, left to right within a span length.
#[must_use]
pub fn generate_ngrams(tokens: &[&str], max_span: usize) -> Vec<NGram> {
    let longest = max_span.min(tokens.len());
    let mut grams = Vec::with_capacity(expected_count(tokens.len(), max_span));
    for len in (1..=longest).rev() {
        for (start, window) in tokens.windows(len).enumerate() {
            grams.push(NGram {
                text: window.join(" "),
                start,
                len,
            });
        }
    }
    grams
}

/// Number of n-grams [`generate_ngrams`] returns for `token_count` tokens
#[must_use]
pub fn expected_count(token_count: usize, max_span: usize) -> usize {
    let longest = max_span.min(token_count);
    (1..=longest).map(|n| token_count - n + 1).sum()
}
