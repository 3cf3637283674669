//! Type module registry for the Quakeline indexer.
//!
//! A module recognizes one family of product types, extracts a
//! [`ProductSummary`](quakeline_types::ProductSummary) from a raw product,
//! and ranks competing summaries of the same type via a preferred weight.
//! Modules are consulted in registration order; the first one reporting
//! [`SupportLevel::Supported`] wins, and products nothing claims are indexed
//! through the generic default module.
//!
//! New product types are added by registering a new module, never by
//! editing the dispatcher.

mod default;
mod dyfi;
mod error;
mod registry;
mod shakemap;
mod trump;

pub use default::{
    DefaultModule, AGGREGATOR_BONUS, BASE_PREFERRED_WEIGHT, DEFAULT_AGGREGATOR_SOURCE,
    OWNERSHIP_BONUS,
};
pub use dyfi::DyfiModule;
pub use error::ExtractionError;
pub use registry::ModuleRegistry;
pub use shakemap::{ShakeMapModule, EPICENTER_IN_MAP_BONUS};
pub use trump::{TrumpModule, TRUMP_PREFERRED_WEIGHT};

use quakeline_types::{Product, ProductSummary};

/// Whether a module understands a given product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportLevel {
    /// The module understands this product and should summarize it.
    Supported,
    /// The module does not recognize this product.
    Unsupported,
}

/// One per-product-type handler.
///
/// `preferred_weight` must be a pure function of the summary's own fields
/// (no clocks, no hidden state) so ranking is stable across re-evaluation
/// and replay.
pub trait IndexerModule: Send + Sync {
    /// Whether this module understands the product.
    fn support_level(&self, product: &Product) -> SupportLevel;

    /// Extracts the indexable summary, including any type-specific
    /// properties this module contributes, and assigns the preferred
    /// weight.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] when required attributes are absent or
    /// malformed.
    fn summarize(&self, product: &Product) -> Result<ProductSummary, ExtractionError>;

    /// Ranking weight for a summary this module extracted.
    fn preferred_weight(&self, summary: &ProductSummary) -> i64;
}
