//! Felt-report ("did you feel it") module.

use quakeline_types::{Product, ProductSummary};

use crate::{DefaultModule, ExtractionError, IndexerModule, SupportLevel};

/// Module for `dyfi` products.
///
/// Contributors have shipped the felt-report count under two names over the
/// years; downstream consumers only look for `num-responses`, so the legacy
/// `numResp` spelling is normalized here at extraction time.
#[derive(Debug, Clone, Default)]
pub struct DyfiModule {
    generic: DefaultModule,
}

impl DyfiModule {
    pub fn new(generic: DefaultModule) -> Self {
        Self { generic }
    }
}

impl IndexerModule for DyfiModule {
    fn support_level(&self, product: &Product) -> SupportLevel {
        if product.id.product_type == "dyfi" {
            SupportLevel::Supported
        } else {
            SupportLevel::Unsupported
        }
    }

    fn summarize(&self, product: &Product) -> Result<ProductSummary, ExtractionError> {
        let mut summary = self.generic.extract(product)?;
        if !summary.properties.contains_key("num-responses") {
            if let Some(legacy) = summary.properties.get("numResp").cloned() {
                summary.properties.insert("num-responses".into(), legacy);
            }
        }
        Ok(self.generic.finish(self, product, summary))
    }

    fn preferred_weight(&self, summary: &ProductSummary) -> i64 {
        self.generic.preferred_weight(summary)
    }
}
