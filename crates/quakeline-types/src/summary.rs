//! The indexable projection of one product revision.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::product::{EventKey, ProductId, ProductStatus};

/// A product's queryable projection, extracted by a type module.
///
/// Immutable once constructed: a new revision produces a new summary that
/// supersedes the old one, nothing is edited in place. `index_id` is
/// assigned by the persisted index when the summary is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Row id in the persisted index; `None` until stored.
    #[serde(default)]
    pub index_id: Option<i64>,
    pub id: ProductId,
    pub status: ProductStatus,
    /// Ranking weight among summaries of the same type in one event.
    pub preferred_weight: i64,
    /// Free-form per-type attributes.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Event keys this product explicitly associates with.
    #[serde(default)]
    pub associated: Vec<EventKey>,
    /// Typed conveniences parsed from properties by the extracting module.
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub magnitude: Option<f64>,
    /// Origin time, epoch milliseconds.
    #[serde(default)]
    pub event_time: Option<i64>,
    #[serde(default)]
    pub version: Option<String>,
}

impl ProductSummary {
    /// The association identity of this summary.
    pub fn event_key(&self) -> EventKey {
        self.id.event_key()
    }

    /// Whether this revision withdraws its series.
    pub fn is_deleted(&self) -> bool {
        self.status == ProductStatus::Delete
    }

    /// All event keys this summary connects: its own plus its associations.
    pub fn connected_keys(&self) -> Vec<EventKey> {
        let mut keys = Vec::with_capacity(1 + self.associated.len());
        keys.push(self.event_key());
        for key in &self.associated {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Returns a property value, if present.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

/// Total preference order between two summaries of the same type.
///
/// Highest `preferred_weight` wins; ties break to the most recent
/// `update_time`, then to the lexicographically smallest [`ProductId`] so
/// that re-evaluation and replay always rank identically.
///
/// `Ordering::Greater` means `a` is preferred over `b`.
pub fn cmp_preference(a: &ProductSummary, b: &ProductSummary) -> Ordering {
    a.preferred_weight
        .cmp(&b.preferred_weight)
        .then(a.id.update_time.cmp(&b.id.update_time))
        .then_with(|| b.id.cmp(&a.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(source: &str, update_time: i64, weight: i64) -> ProductSummary {
        ProductSummary {
            index_id: None,
            id: ProductId::new(source, "origin", format!("{source}2024abcd"), update_time),
            status: ProductStatus::Update,
            preferred_weight: weight,
            properties: BTreeMap::new(),
            associated: Vec::new(),
            latitude: None,
            longitude: None,
            depth: None,
            magnitude: None,
            event_time: None,
            version: None,
        }
    }

    #[test]
    fn weight_dominates_preference() {
        let low = summary("us", 2_000, 100);
        let high = summary("atlas", 1_000, 201);
        assert_eq!(cmp_preference(&high, &low), Ordering::Greater);
    }

    #[test]
    fn update_time_breaks_weight_ties() {
        let older = summary("us", 1_000, 100);
        let newer = summary("ci", 2_000, 100);
        assert_eq!(cmp_preference(&newer, &older), Ordering::Greater);
    }

    #[test]
    fn equal_weight_and_time_is_still_a_total_order() {
        let a = summary("ci", 1_000, 100);
        let b = summary("us", 1_000, 100);
        // "ci..." sorts before "us...", so a is preferred.
        assert_eq!(cmp_preference(&a, &b), Ordering::Greater);
        assert_eq!(cmp_preference(&b, &a), Ordering::Less);
    }

    #[test]
    fn connected_keys_deduplicate() {
        let mut s = summary("us", 1_000, 100);
        s.associated.push(EventKey::new("us", "us2024abcd"));
        s.associated.push(EventKey::new("ci", "ci999"));
        assert_eq!(
            s.connected_keys(),
            vec![EventKey::new("us", "us2024abcd"), EventKey::new("ci", "ci999")]
        );
    }
}
