//! Administrative override ("trump") module.

use quakeline_types::{Product, ProductSummary, TRUMP_TYPE_PREFIX};

use crate::{DefaultModule, ExtractionError, IndexerModule, SupportLevel};

/// Weight high enough to outrank any organically computed weight, so a
/// trump is always the preferred summary of its type.
pub const TRUMP_PREFERRED_WEIGHT: i64 = 100_000;

/// Module for `trump-*` products.
///
/// A trump is indexed as a normal summary with an association to the
/// trumped id and a weight that always wins. Deleting the trump restores
/// the organic ranking, which is what makes overrides reversible.
#[derive(Debug, Clone, Default)]
pub struct TrumpModule {
    generic: DefaultModule,
}

impl TrumpModule {
    pub fn new(generic: DefaultModule) -> Self {
        Self { generic }
    }
}

impl IndexerModule for TrumpModule {
    fn support_level(&self, product: &Product) -> SupportLevel {
        if product.id.product_type.starts_with(TRUMP_TYPE_PREFIX) {
            SupportLevel::Supported
        } else {
            SupportLevel::Unsupported
        }
    }

    fn summarize(&self, product: &Product) -> Result<ProductSummary, ExtractionError> {
        let summary = self.generic.extract(product)?;
        // A trump must name what it overrides; its own key counts when the
        // trump shares the trumped product's code.
        if summary.associated.is_empty() && product.links.is_empty() {
            return Err(ExtractionError::MissingTrumpTarget);
        }
        Ok(self.generic.finish(self, product, summary))
    }

    fn preferred_weight(&self, _summary: &ProductSummary) -> i64 {
        TRUMP_PREFERRED_WEIGHT
    }
}
