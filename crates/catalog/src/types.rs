use crate::error::{CatalogError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Kind of financial master record an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Ledger,
    Group,
    CostCentre,
    CostCategory,
    StockItem,
    StockGroup,
    StockCategory,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Ledger,
        Category::Group,
        Category::CostCentre,
        Category::CostCategory,
        Category::StockItem,
        Category::StockGroup,
        Category::StockCategory,
    ];

    /// Stable machine identifier (snake_case)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::Group => "group",
            Self::CostCentre => "cost_centre",
            Self::CostCategory => "cost_category",
            Self::StockItem => "stock_item",
            Self::StockGroup => "stock_group",
            Self::StockCategory => "stock_category",
        }
    }

    /// Human-readable label used in prompts
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ledger => "Ledger",
            Self::Group => "Group",
            Self::CostCentre => "Cost Centre",
            Self::CostCategory => "Cost Category",
            Self::StockItem => "Stock Item",
            Self::StockGroup => "Stock Group",
            Self::StockCategory => "Stock Category",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    /// Accepts snake_case ids, display labels and the plural table-style
    /// spellings master-data exports use (`Ledgers`, `Stock_Groups`, `Cost_Center`).
    fn from_str(raw: &str) -> Result<Self> {
        let key = raw
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
            .collect::<String>();
        let key = key.split_whitespace().collect::<Vec<_>>().join(" ");
        let category = match key.as_str() {
            "ledger" | "ledgers" => Self::Ledger,
            "group" | "groups" | "ledger group" | "ledger groups" => Self::Group,
            "cost centre" | "cost centres" | "cost center" | "cost centers" | "costcentre" => {
                Self::CostCentre
            }
            "cost category" | "cost categories" => Self::CostCategory,
            "stock item" | "stock items" | "stock" | "item" | "items" => Self::StockItem,
            "stock group" | "stock groups" => Self::StockGroup,
            "stock category" | "stock categories" => Self::StockCategory,
            _ => return Err(CatalogError::UnknownCategory(raw.to_string())),
        };
        Ok(category)
    }
}

impl TryFrom<String> for Category {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

/// Identifier of an entity, unique within its category
///
/// Master-data sources hand out numeric primary keys or opaque strings; both
/// are kept as text so ordering is lexicographic and deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self::from(n),
            RawId::Text(s) => Self(s),
        })
    }
}

/// A `(id, name)` row as returned by a master-data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
}

impl EntityRecord {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A named financial record to ground queries against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub category: Category,
}

/// Immutable master-data snapshot: category → ordered entities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySet {
    by_category: BTreeMap<Category, Vec<Entity>>,
}

impl EntitySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a whole category
    #[must_use]
    pub fn with_category<I, R>(mut self, category: Category, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<EntityRecord>,
    {
        self.insert(category, records.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the entities of one category, keeping source order
    pub fn insert(&mut self, category: Category, records: Vec<EntityRecord>) {
        let entities = records
            .into_iter()
            .map(|record| Entity {
                id: record.id,
                name: record.name,
                category,
            })
            .collect();
        self.by_category.insert(category, entities);
    }

    #[must_use]
    pub fn get(&self, category: Category) -> &[Entity] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.by_category.keys().copied()
    }

    /// All entities, category order first, then source order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.by_category.values().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-category entity counts
    #[must_use]
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        self.by_category
            .iter()
            .map(|(category, entities)| (*category, entities.len()))
            .collect()
    }

    /// Check the snapshot contract: non-empty names, ids unique per category,
    /// every required category populated.
    pub fn validate(&self, required: &[Category]) -> Result<()> {
        for category in required {
            if self.get(*category).is_empty() {
                return Err(CatalogError::EmptyCategory(*category));
            }
        }

        for (category, entities) in &self.by_category {
            let mut seen = HashSet::with_capacity(entities.len());
            for entity in entities {
                if entity.name.trim().is_empty() {
                    return Err(CatalogError::EmptyName {
                        category: *category,
                        id: entity.id.clone(),
                    });
                }
                if !seen.insert(&entity.id) {
                    return Err(CatalogError::DuplicateId {
                        category: *category,
                        id: entity.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// SHA-256 over the canonical entity listing, hex encoded
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for entity in self.iter() {
            hasher.update(entity.category.as_str().as_bytes());
            hasher.update([0x1f]);
            hasher.update(entity.id.as_str().as_bytes());
            hasher.update([0x1f]);
            hasher.update(entity.name.as_bytes());
            hasher.update([0x1e]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Parse the `{ "<category>": [{"id": .., "name": ..}, ..] }` document format.
    ///
    /// Two keys spelling the same category (`"Ledgers"` and `"ledger"`) are
    /// rejected rather than letting one list replace the other.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let parsed: BTreeMap<String, Vec<EntityRecord>> = serde_json::from_str(raw)?;
        let mut labels: BTreeMap<Category, String> = BTreeMap::new();
        let mut set = Self::new();
        for (label, records) in parsed {
            let category: Category = label.parse()?;
            if let Some(first) = labels.insert(category, label.clone()) {
                return Err(CatalogError::DuplicateCategory {
                    category,
                    first,
                    second: label,
                });
            }
            set.insert(category, records);
        }
        Ok(set)
    }

    /// Inverse of [`EntitySet::from_json_str`]
    pub fn to_json_string(&self) -> Result<String> {
        let doc: BTreeMap<Category, Vec<EntityRecord>> = self
            .by_category
            .iter()
            .map(|(category, entities)| {
                let records = entities
                    .iter()
                    .map(|e| EntityRecord::new(e.id.clone(), e.name.clone()))
                    .collect();
                (*category, records)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

impl<I: Into<EntityId>, N: Into<String>> From<(I, N)> for EntityRecord {
    fn from((id, name): (I, N)) -> Self {
        Self::new(id, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> EntitySet {
        EntitySet::new()
            .with_category(
                Category::Ledger,
                [(1u64, "3M India Limited-P"), (2u64, "Accord Software and Systems Pvt.Ltd")],
            )
            .with_category(Category::Group, [(10u64, "Sales Interstate")])
    }

    #[test]
    fn parses_source_category_spellings() {
        assert_eq!("Ledgers".parse::<Category>().unwrap(), Category::Ledger);
        assert_eq!("Stock_Groups".parse::<Category>().unwrap(), Category::StockGroup);
        assert_eq!("Stock_Categories".parse::<Category>().unwrap(), Category::StockCategory);
        assert_eq!("Cost_Center".parse::<Category>().unwrap(), Category::CostCentre);
        assert_eq!("Cost Category".parse::<Category>().unwrap(), Category::CostCategory);
        assert_eq!("stock_item".parse::<Category>().unwrap(), Category::StockItem);
        assert!("Taxation & Compliance".parse::<Category>().is_err());
    }

    #[test]
    fn iterates_in_category_then_source_order() {
        let set = sample();
        let names: Vec<_> = set.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "3M India Limited-P",
                "Accord Software and Systems Pvt.Ltd",
                "Sales Interstate"
            ]
        );
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn rejects_duplicate_ids_within_a_category() {
        let set = EntitySet::new().with_category(Category::Ledger, [(1u64, "A"), (1u64, "B")]);
        let err = set.validate(&[]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { category: Category::Ledger, .. }));
    }

    #[test]
    fn same_id_in_different_categories_is_fine() {
        let set = EntitySet::new()
            .with_category(Category::Ledger, [(1u64, "Cash")])
            .with_category(Category::Group, [(1u64, "Cash-in-Hand")]);
        assert!(set.validate(&[]).is_ok());
    }

    #[test]
    fn rejects_blank_names_and_missing_required_categories() {
        let blank = EntitySet::new().with_category(Category::Ledger, [(1u64, "  ")]);
        assert!(matches!(blank.validate(&[]), Err(CatalogError::EmptyName { .. })));

        let set = sample();
        assert!(matches!(
            set.validate(&[Category::StockItem]),
            Err(CatalogError::EmptyCategory(Category::StockItem))
        ));
    }

    #[test]
    fn two_spellings_of_one_category_are_rejected() {
        let raw = r#"{
            "Ledgers": [{"id": 1, "name": "Cash"}],
            "ledger": [{"id": 2, "name": "Bank"}]
        }"#;
        let err = EntitySet::from_json_str(raw).unwrap_err();
        assert!(
            matches!(err, CatalogError::DuplicateCategory { category: Category::Ledger, .. }),
            "{err}"
        );
    }

    #[test]
    fn unknown_category_key_is_an_error() {
        let err = EntitySet::from_json_str(r#"{"Vouchers": []}"#).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCategory(ref label) if label == "Vouchers"));
    }

    #[test]
    fn json_ids_may_be_numbers_or_strings() {
        let raw = r#"{
            "Ledgers": [{"id": 7, "name": "Courier Charges"}],
            "cost_centre": [{"id": "CC-01", "name": "Administration"}]
        }"#;
        let set = EntitySet::from_json_str(raw).unwrap();
        assert_eq!(set.get(Category::Ledger)[0].id, EntityId::from("7"));
        assert_eq!(set.get(Category::CostCentre)[0].id.as_str(), "CC-01");

        let round = EntitySet::from_json_str(&set.to_json_string().unwrap()).unwrap();
        assert_eq!(round, set);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = sample().with_category(Category::Group, [(10u64, "Sales Intrastate")]);
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
