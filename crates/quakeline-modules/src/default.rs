//! Generic extraction and the reference weighting rule.

use std::str::FromStr;

use quakeline_types::{Product, ProductSummary};

use crate::{ExtractionError, IndexerModule, SupportLevel};

/// Base ranking weight every summary starts from.
pub const BASE_PREFERRED_WEIGHT: i64 = 100;

/// Bonus when the contributing source owns the event id (the code carries
/// the source's network prefix).
pub const OWNERSHIP_BONUS: i64 = 1;

/// Bonus when the contributing source is the authoritative aggregator.
pub const AGGREGATOR_BONUS: i64 = 100;

/// The designated authoritative aggregator network.
pub const DEFAULT_AGGREGATOR_SOURCE: &str = "atlas";

/// The generic module: understands every product at the unspecialized
/// level.
///
/// Extracts the standard queryable attributes (location, magnitude, origin
/// time, version) and applies the reference weighting rule. Specialized
/// modules embed one of these to reuse both.
#[derive(Debug, Clone)]
pub struct DefaultModule {
    aggregator_source: String,
}

impl Default for DefaultModule {
    fn default() -> Self {
        Self::new(DEFAULT_AGGREGATOR_SOURCE)
    }
}

impl DefaultModule {
    pub fn new(aggregator_source: impl Into<String>) -> Self {
        Self {
            aggregator_source: aggregator_source.into(),
        }
    }

    /// Core extraction shared by every module: validates the id, copies
    /// properties and associations, and parses the typed conveniences.
    ///
    /// The returned summary has weight 0; callers assign the weight via
    /// their own `preferred_weight` so specialized adjustments apply.
    pub fn extract(&self, product: &Product) -> Result<ProductSummary, ExtractionError> {
        if product.id.source.is_empty() {
            return Err(ExtractionError::EmptyIdField("source"));
        }
        if product.id.product_type.is_empty() {
            return Err(ExtractionError::EmptyIdField("type"));
        }
        if product.id.code.is_empty() {
            return Err(ExtractionError::EmptyIdField("code"));
        }

        let mut summary = ProductSummary {
            index_id: None,
            id: product.id.clone(),
            status: product.status,
            preferred_weight: 0,
            properties: product.properties.clone(),
            associated: product.links.clone(),
            latitude: parse_decimal(product, "latitude")?,
            longitude: parse_decimal(product, "longitude")?,
            depth: parse_decimal(product, "depth")?,
            magnitude: parse_decimal(product, "magnitude")?,
            event_time: parse_event_time(product)?,
            version: product.property("version").map(str::to_string),
        };
        // Own key in the links list is redundant; every summary already
        // connects to its own key.
        summary.associated.retain(|key| *key != summary.id.event_key());
        Ok(summary)
    }

    /// Applies the weight to a freshly extracted summary, honoring an
    /// explicit product weight over the computed one.
    pub fn finish(
        &self,
        module: &dyn IndexerModule,
        product: &Product,
        mut summary: ProductSummary,
    ) -> ProductSummary {
        summary.preferred_weight = match product.preferred_weight {
            Some(explicit) => explicit,
            None => module.preferred_weight(&summary),
        };
        summary
    }
}

impl IndexerModule for DefaultModule {
    fn support_level(&self, _product: &Product) -> SupportLevel {
        // The generic level understands everything.
        SupportLevel::Supported
    }

    fn summarize(&self, product: &Product) -> Result<ProductSummary, ExtractionError> {
        let summary = self.extract(product)?;
        Ok(self.finish(self, product, summary))
    }

    fn preferred_weight(&self, summary: &ProductSummary) -> i64 {
        let mut weight = BASE_PREFERRED_WEIGHT;
        if summary.id.code.starts_with(&summary.id.source) {
            weight += OWNERSHIP_BONUS;
        }
        if summary.id.source == self.aggregator_source {
            weight += AGGREGATOR_BONUS;
        }
        weight
    }
}

fn parse_decimal(product: &Product, name: &str) -> Result<Option<f64>, ExtractionError> {
    match product.property(name) {
        None => Ok(None),
        Some(raw) => f64::from_str(raw.trim())
            .map(Some)
            .map_err(|_| ExtractionError::MalformedProperty {
                name: name.to_string(),
                value: raw.to_string(),
            }),
    }
}

/// Origin time arrives as ISO-8601 (`eventtime` property); stored as epoch
/// milliseconds.
fn parse_event_time(product: &Product) -> Result<Option<i64>, ExtractionError> {
    match product.property("eventtime") {
        None => Ok(None),
        Some(raw) => chrono::DateTime::parse_from_rfc3339(raw.trim())
            .map(|t| Some(t.timestamp_millis()))
            .map_err(|_| ExtractionError::MalformedProperty {
                name: "eventtime".to_string(),
                value: raw.to_string(),
            }),
    }
}
