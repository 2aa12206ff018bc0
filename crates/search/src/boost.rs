use crate::config::BoostConfig;
use grounder_catalog::Category;
use std::collections::BTreeMap;

/// Built-in keyword lists: words in a question that hint at a category
#[must_use]
pub fn default_keywords() -> BTreeMap<Category, Vec<String>> {
    let table: [(Category, &[&str]); 7] = [
        (
            Category::Ledger,
            &[
                "sales", "turnover", "revenue", "income", "expenses", "purchase", "payable",
                "receivable", "debtor", "creditor", "interest", "commission", "discount",
                "royalty", "fees", "charges", "tds", "gst", "tax", "igst", "cgst", "sgst", "vat",
                "service tax", "excise", "duty", "cess",
            ],
        ),
        (
            Category::StockItem,
            &[
                "inventory", "stock", "product", "item", "goods", "material", "spare",
                "component", "consumable", "raw material", "finished goods", "wip", "warehouse",
                "batch", "lot",
            ],
        ),
        (
            Category::Group,
            &["account group", "ledger group", "category", "division", "segment", "department"],
        ),
        (
            Category::CostCentre,
            &[
                "department", "project", "branch", "unit", "section", "division", "office",
                "team", "zone", "region",
            ],
        ),
        (
            Category::CostCategory,
            &["allocation", "cost pool", "expense type", "overhead", "category"],
        ),
        (
            Category::StockGroup,
            &["stock group", "item group", "product group"],
        ),
        (
            Category::StockCategory,
            &["stock category", "item category", "product category"],
        ),
    ];

    table
        .into_iter()
        .map(|(category, words)| (category, words.iter().map(|w| w.to_string()).collect()))
        .collect()
}

/// Category → keyword set; each distinct keyword found in the lowercased raw
/// query adds `increment` to every candidate of that category.
#[derive(Debug, Clone)]
pub struct BoostTable {
    keywords: BTreeMap<Category, Vec<String>>,
    increment: f32,
    max_total: f32,
}

impl BoostTable {
    /// Keywords are lowercased, trimmed and deduplicated per category
    #[must_use]
    pub fn new(config: &BoostConfig) -> Self {
        let keywords = config
            .keywords
            .iter()
            .map(|(category, words)| {
                let mut words: Vec<String> = words
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                words.sort_unstable();
                words.dedup();
                (*category, words)
            })
            .collect();
        Self {
            keywords,
            increment: config.increment,
            max_total: config.max_total,
        }
    }

    /// Boost for one category. Substring containment on the lowercased query,
    /// not token matching.
    #[must_use]
    pub fn boost_for(&self, lowered_query: &str, category: Category) -> f32 {
        let matched = self
            .keywords
            .get(&category)
            .map_or(0, |words| {
                words.iter().filter(|w| lowered_query.contains(w.as_str())).count()
            });
        (matched as f32 * self.increment).min(self.max_total)
    }

    /// Non-zero boosts of every category for a raw query
    #[must_use]
    pub fn boosts(&self, raw_query: &str) -> BTreeMap<Category, f32> {
        let lowered = raw_query.to_lowercase();
        self.keywords
            .keys()
            .map(|category| (*category, self.boost_for(&lowered, *category)))
            .filter(|(_, boost)| *boost > 0.0)
            .collect()
    }
}

impl Default for BoostTable {
    fn default() -> Self {
        Self::new(&BoostConfig::default())
    }
}
