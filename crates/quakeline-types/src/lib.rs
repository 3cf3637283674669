//! Shared data model for the Quakeline platform.
//!
//! Defines the product and event types every other crate builds on:
//! [`ProductId`], [`Product`], [`ProductSummary`], [`EventKey`], and
//! [`Event`]. The correlation engine, the persisted index, and the feed
//! projections all consume these types; none of them carry any storage or
//! transport concerns of their own.

mod event;
mod product;
mod summary;

pub use event::Event;
pub use product::{EventKey, ParseProductStatusError, Product, ProductId, ProductStatus};
pub use summary::{cmp_preference, ProductSummary};

/// Product type carrying the authoritative earthquake origin.
pub const ORIGIN_TYPE: &str = "origin";

/// Prefix marking administrative override ("trump") product types.
pub const TRUMP_TYPE_PREFIX: &str = "trump-";

/// Whether summaries of this product type define an event's id.
///
/// Plain origins do, and so do origin trumps: when an administrative
/// `trump-origin` product is preferred its own code becomes the event id.
pub fn is_origin_bearing(product_type: &str) -> bool {
    product_type == ORIGIN_TYPE || product_type == "trump-origin"
}
