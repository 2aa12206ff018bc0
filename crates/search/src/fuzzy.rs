use crate::config::FuzzyConfig;
use crate::ngram::{generate_ngrams, NGram};
use crate::normalize::tokens;
use crate::types::Score;
use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use strsim::normalized_levenshtein;

/// Entity name prepared for fuzzy comparison
#[derive(Debug, Clone)]
pub struct NameForm {
    tokens: Vec<String>,
    sorted: String,
    /// Characters over all tokens, separators excluded
    chars: usize,
    /// Position of the entity in (id, category) order; tie-breaker
    rank: u32,
}

impl NameForm {
    #[must_use]
    pub fn new(normalized: &str, rank: u32) -> Self {
        let tokens: Vec<String> = tokens(normalized).map(str::to_string).collect();
        Self {
            sorted: sorted_join(&tokens),
            chars: tokens.iter().map(String::len).sum(),
            tokens,
            rank,
        }
    }

    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }
}

/// Best fuzzy score one entity reached over all query phrases
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyHit {
    pub entity: usize,
    pub score: f32,
    pub phrase: String,
    pub phrase_len: usize,
}

/// Token-order-insensitive edit-distance matcher.
///
/// A phrase scores against a name as the better of the whole-name ratio and a
/// scaled ratio against the best run of consecutive name tokens of the same
/// length, so "3m india" still lands on "3m india limited p". The window
/// ratio is weighted by the share of the name's characters the window spans:
/// "ltd" alone stays under the threshold against "aero mfg pvt ltd".
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    threshold: f32,
    top_n: usize,
    partial_scale: f32,
    coverage_floor: f32,
    token_fallback: bool,
}

impl FuzzyMatcher {
    #[must_use]
    pub fn new(config: &FuzzyConfig) -> Self {
        Self {
            threshold: config.threshold,
            top_n: config.top_n.max(1),
            partial_scale: config.partial_scale,
            coverage_floor: config.coverage_floor,
            token_fallback: config.token_fallback,
        }
    }

    /// Similarity of a normalized phrase to a name on the 0..=100 scale
    #[must_use]
    pub fn score(&self, phrase: &str, name: &NameForm) -> f32 {
        let phrase_tokens: Vec<&str> = tokens(phrase).collect();
        self.score_sorted(&sorted_join(&phrase_tokens), phrase_tokens.len(), name, 0.0)
    }

    /// `floor` lets the window pass stop early once it cannot beat a score
    /// already good enough
    fn score_sorted(&self, phrase: &str, phrase_tokens: usize, name: &NameForm, floor: f32) -> f32 {
        if name.tokens.is_empty() || phrase.is_empty() {
            return 0.0;
        }

        let whole = if ratio_bound(phrase, &name.sorted) >= floor {
            ratio(phrase, &name.sorted)
        } else {
            0.0
        };

        let window_cap = self.partial_scale * 100.0;
        if phrase_tokens >= name.tokens.len() || window_cap <= whole || window_cap < floor {
            return whole;
        }

        let mut best_window = 0.0f32;
        for window in name.tokens.windows(phrase_tokens) {
            let weight = self.partial_scale * self.coverage_weight(window, name);
            let candidate = sorted_join(window);
            let bound = weight * ratio_bound(phrase, &candidate);
            if bound < floor || bound <= best_window {
                continue;
            }
            best_window = best_window.max(weight * ratio(phrase, &candidate));
        }
        whole.max(best_window)
    }

    /// Maps the window's share of the name's characters onto
    /// `coverage_floor..=1`
    fn coverage_weight(&self, window: &[String], name: &NameForm) -> f32 {
        let covered: usize = window.iter().map(String::len).sum();
        let coverage = covered as f32 / name.chars.max(1) as f32;
        self.coverage_floor + (1.0 - self.coverage_floor) * coverage
    }

    /// The `top_n` best entities for one phrase at or above the threshold,
    /// best first, smaller rank first on equal score.
    pub fn top_matches(
        &self,
        phrase: &str,
        names: &[NameForm],
        allow: &dyn Fn(usize) -> bool,
    ) -> Vec<(usize, f32)> {
        let phrase_tokens: Vec<&str> = tokens(phrase).collect();
        let sorted = sorted_join(&phrase_tokens);

        // Min-heap on (score, -rank): the root is the weakest kept entry
        let mut heap: BinaryHeap<Reverse<(Score, Reverse<u32>, usize)>> =
            BinaryHeap::with_capacity(self.top_n + 1);

        for (entity, name) in names.iter().enumerate() {
            if !allow(entity) {
                continue;
            }
            let floor = match heap.peek() {
                Some(Reverse((weakest, _, _))) if heap.len() == self.top_n => {
                    weakest.0.max(self.threshold)
                }
                _ => self.threshold,
            };
            let score = self.score_sorted(&sorted, phrase_tokens.len(), name, floor);
            if score < self.threshold {
                continue;
            }
            heap.push(Reverse((Score(score), Reverse(name.rank), entity)));
            if heap.len() > self.top_n {
                heap.pop();
            }
        }

        let mut kept: Vec<_> = heap.into_iter().map(|Reverse(entry)| entry).collect();
        kept.sort_by(|a, b| b.cmp(a));
        kept.into_iter()
            .map(|(score, _, entity)| (entity, score.0))
            .collect()
    }

    /// Best hit per entity over all phrases.
    ///
    /// Phrases arrive longest first, so on equal scores the longer phrase
    /// wins. Output is ordered by score, then phrase length, then rank.
    pub fn match_phrases(
        &self,
        phrases: &[NGram],
        names: &[NameForm],
        allow: &dyn Fn(usize) -> bool,
    ) -> Vec<FuzzyHit> {
        let mut best: HashMap<usize, FuzzyHit> = HashMap::new();

        for gram in phrases {
            for (entity, score) in self.top_matches(&gram.text, names, allow) {
                let hit = FuzzyHit {
                    entity,
                    score,
                    phrase: gram.text.clone(),
                    phrase_len: gram.len,
                };
                match best.entry(entity) {
                    Entry::Occupied(mut slot) => {
                        if score > slot.get().score {
                            slot.insert(hit);
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(hit);
                    }
                }
            }
        }

        let mut hits: Vec<FuzzyHit> = best.into_values().collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.phrase_len.cmp(&a.phrase_len))
                .then_with(|| names[a.entity].rank.cmp(&names[b.entity].rank))
        });
        hits
    }

    /// N-gram pass over the filtered tokens; if it finds nothing and the
    /// fallback is on, a single-token pass over every unfiltered token longer
    /// than one character.
    pub fn match_query(
        &self,
        kept_tokens: &[&str],
        all_tokens: &[&str],
        max_ngram: usize,
        names: &[NameForm],
        allow: &dyn Fn(usize) -> bool,
    ) -> Vec<FuzzyHit> {
        let grams = generate_ngrams(kept_tokens, max_ngram);
        let hits = self.match_phrases(&grams, names, allow);
        if !hits.is_empty() || !self.token_fallback {
            return hits;
        }

        let singles: Vec<&str> = all_tokens
            .iter()
            .copied()
            .filter(|t| t.chars().count() > 1 && !kept_tokens.contains(t))
            .collect();
        if singles.is_empty() {
            return hits;
        }
        log::debug!("Fuzzy token fallback over {} tokens", singles.len());
        self.match_phrases(&generate_ngrams(&singles, 1), names, allow)
    }
}

fn sorted_join<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut sorted: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}

fn ratio(a: &str, b: &str) -> f32 {
    (normalized_levenshtein(a, b) * 100.0) as f32
}

/// Upper bound of [`ratio`] from lengths alone: the edit distance is at least
/// the length difference.
fn ratio_bound(a: &str, b: &str) -> f32 {
    let (la, lb) = (a.len(), b.len());
    let longest = la.max(lb);
    if longest == 0 {
        return 100.0;
    }
    (1.0 - la.abs_diff(lb) as f32 / longest as f32) * 100.0
}
