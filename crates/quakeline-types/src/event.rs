//! The aggregate of all product summaries describing one earthquake.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::product::ProductStatus;
use crate::summary::{cmp_preference, ProductSummary};
use crate::{is_origin_bearing, ORIGIN_TYPE};

/// One physical earthquake as the index understands it.
///
/// Owns every summary ever contributed, in insertion order, including
/// superseded revisions and withdrawal tombstones. Derived queries operate
/// on the latest revision of each `(source, type, code)` series; a series
/// whose latest revision is a DELETE is withdrawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable internal id, assigned by the persisted index.
    pub index_id: i64,
    /// Full contribution history.
    pub summaries: Vec<ProductSummary>,
}

impl Event {
    pub fn new(index_id: i64) -> Self {
        Self {
            index_id,
            summaries: Vec::new(),
        }
    }

    /// The latest revision of every series in this event, tombstones included.
    pub fn latest_summaries(&self) -> Vec<&ProductSummary> {
        let mut latest: Vec<&ProductSummary> = Vec::new();
        for summary in &self.summaries {
            match latest
                .iter_mut()
                .find(|existing| existing.id.same_series(&summary.id))
            {
                Some(existing) => {
                    if summary.id.update_time > existing.id.update_time {
                        *existing = summary;
                    }
                }
                None => latest.push(summary),
            }
        }
        latest
    }

    /// Latest revisions that have not been withdrawn.
    pub fn live_summaries(&self) -> Vec<&ProductSummary> {
        self.latest_summaries()
            .into_iter()
            .filter(|s| !s.is_deleted())
            .collect()
    }

    /// An event with no live series is deleted.
    pub fn is_deleted(&self) -> bool {
        !self.summaries.is_empty() && self.live_summaries().is_empty()
    }

    /// Live summaries of one type, most preferred first.
    pub fn products(&self, product_type: &str) -> Vec<&ProductSummary> {
        let mut matching: Vec<&ProductSummary> = self
            .live_summaries()
            .into_iter()
            .filter(|s| s.id.product_type == product_type)
            .collect();
        matching.sort_by(|a, b| cmp_preference(*b, *a));
        matching
    }

    /// The preferred (highest ranked, non-withdrawn) summary of one type.
    pub fn preferred_product(&self, product_type: &str) -> Option<&ProductSummary> {
        self.products(product_type).into_iter().next()
    }

    /// The preferred origin-bearing summary; defines the event id.
    ///
    /// Considers plain origins and origin trumps, so an administrative
    /// override takes the id over when its weight wins.
    pub fn preferred_origin(&self) -> Option<&ProductSummary> {
        self.live_summaries()
            .into_iter()
            .filter(|s| is_origin_bearing(&s.id.product_type))
            .max_by(|a, b| cmp_preference(*a, *b))
    }

    /// The summary the event id is derived from.
    ///
    /// Preferred origin-bearing summary when one exists; otherwise the most
    /// preferred live summary; for a fully deleted event, the most preferred
    /// tombstone so the id stays stable after withdrawal.
    pub fn id_summary(&self) -> Option<&ProductSummary> {
        self.preferred_origin()
            .or_else(|| {
                self.live_summaries()
                    .into_iter()
                    .max_by(|a, b| cmp_preference(*a, *b))
            })
            .or_else(|| {
                self.latest_summaries()
                    .into_iter()
                    .max_by(|a, b| cmp_preference(*a, *b))
            })
    }

    /// Consumer-facing event id: the code of the id-defining summary.
    pub fn event_id(&self) -> Option<String> {
        self.id_summary().map(|s| s.id.code.clone())
    }

    /// Network that contributed the id-defining summary.
    pub fn source(&self) -> Option<String> {
        self.id_summary().map(|s| s.id.source.clone())
    }

    /// Code of the id-defining summary.
    pub fn source_code(&self) -> Option<String> {
        self.id_summary().map(|s| s.id.code.clone())
    }

    /// Preferred magnitude-bearing summary: a dedicated magnitude product
    /// outranks the preferred origin.
    pub fn preferred_magnitude(&self) -> Option<&ProductSummary> {
        self.preferred_product("magnitude")
            .filter(|s| s.magnitude.is_some())
            .or_else(|| self.preferred_product(ORIGIN_TYPE))
    }

    pub fn magnitude(&self) -> Option<f64> {
        self.preferred_magnitude().and_then(|s| s.magnitude)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.preferred_product(ORIGIN_TYPE).and_then(|s| s.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.preferred_product(ORIGIN_TYPE).and_then(|s| s.longitude)
    }

    pub fn depth(&self) -> Option<f64> {
        self.preferred_product(ORIGIN_TYPE).and_then(|s| s.depth)
    }

    /// Origin time, epoch milliseconds.
    pub fn time(&self) -> Option<i64> {
        self.preferred_product(ORIGIN_TYPE).and_then(|s| s.event_time)
    }

    /// Most recent update across every series in the event.
    pub fn update_time(&self) -> Option<i64> {
        self.latest_summaries()
            .iter()
            .map(|s| s.id.update_time)
            .max()
    }

    /// Distinct contributor event codes present in this event.
    pub fn event_ids(&self) -> BTreeSet<String> {
        self.latest_summaries()
            .iter()
            .map(|s| s.id.code.clone())
            .collect()
    }

    /// Distinct contributing sources.
    pub fn sources(&self) -> BTreeSet<String> {
        self.latest_summaries()
            .iter()
            .map(|s| s.id.source.clone())
            .collect()
    }

    /// Distinct product types contributed.
    pub fn types(&self) -> BTreeSet<String> {
        self.latest_summaries()
            .iter()
            .map(|s| s.id.product_type.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductId;
    use std::collections::BTreeMap;

    fn summary(
        source: &str,
        product_type: &str,
        code: &str,
        update_time: i64,
        weight: i64,
        status: ProductStatus,
    ) -> ProductSummary {
        ProductSummary {
            index_id: None,
            id: ProductId::new(source, product_type, code, update_time),
            status,
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
    fn latest_revision_supersedes_older_ones() {
        let mut event = Event::new(1);
        event.summaries.push(summary(
            "us",
            "origin",
            "us2024abcd",
            2_000,
            100,
            ProductStatus::Update,
        ));
        // Out-of-order arrival of an older revision must not take over.
        event.summaries.push(summary(
            "us",
            "origin",
            "us2024abcd",
            1_000,
            100,
            ProductStatus::Update,
        ));

        let latest = event.latest_summaries();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id.update_time, 2_000);
    }

    #[test]
    fn delete_tombstone_withdraws_a_series() {
        let mut event = Event::new(1);
        event.summaries.push(summary(
            "us",
            "origin",
            "us2024abcd",
            1_000,
            100,
            ProductStatus::Update,
        ));
        event.summaries.push(summary(
            "us",
            "origin",
            "us2024abcd",
            2_000,
            100,
            ProductStatus::Delete,
        ));

        assert!(event.live_summaries().is_empty());
        assert!(event.is_deleted());
        // The id survives deletion via the tombstone.
        assert_eq!(event.event_id().as_deref(), Some("us2024abcd"));
    }

    #[test]
    fn preferred_origin_picks_highest_weight_then_recency() {
        let mut event = Event::new(1);
        event.summaries.push(summary(
            "us",
            "origin",
            "us2024abcd",
            1_000,
            100,
            ProductStatus::Update,
        ));
        event.summaries.push(summary(
            "ci",
            "origin",
            "ci999",
            2_000,
            100,
            ProductStatus::Update,
        ));

        // Equal weights: the more recently updated series defines the id.
        assert_eq!(event.event_id().as_deref(), Some("ci999"));
    }

    #[test]
    fn origin_trump_takes_over_the_event_id() {
        let mut event = Event::new(1);
        event.summaries.push(summary(
            "us",
            "origin",
            "us2024abcd",
            2_000,
            100,
            ProductStatus::Update,
        ));
        event.summaries.push(summary(
            "admin",
            "trump-origin",
            "ci999",
            1_000,
            100_000,
            ProductStatus::Update,
        ));

        assert_eq!(event.event_id().as_deref(), Some("ci999"));
        assert_eq!(event.source().as_deref(), Some("admin"));
    }

    #[test]
    fn event_without_origin_falls_back_to_preferred_summary() {
        let mut event = Event::new(1);
        event.summaries.push(summary(
            "atlas",
            "shakemap",
            "atlas19690811212737",
            1_000,
            201,
            ProductStatus::Update,
        ));

        assert_eq!(event.event_id().as_deref(), Some("atlas19690811212737"));
    }

    #[test]
    fn magnitude_prefers_dedicated_magnitude_product() {
        let mut origin = summary(
            "us",
            "origin",
            "us2024abcd",
            1_000,
            100,
            ProductStatus::Update,
        );
        origin.magnitude = Some(6.1);
        let mut magnitude = summary(
            "us",
            "magnitude",
            "us2024abcd",
            1_000,
            100,
            ProductStatus::Update,
        );
        magnitude.magnitude = Some(6.3);

        let mut event = Event::new(1);
        event.summaries.push(origin);
        event.summaries.push(magnitude);

        assert_eq!(event.magnitude(), Some(6.3));
    }
}
