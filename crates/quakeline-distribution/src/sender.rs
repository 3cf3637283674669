//! The destination boundary.

use quakeline_types::Product;

/// Error returned by a destination that could not accept a product.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct SendError(pub String);

impl SendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One downstream destination for products.
///
/// `send` blocks until the product is accepted or rejected; the distributor
/// decides where and how concurrently it runs.
pub trait ProductSender: Send + Sync + 'static {
    /// Stable name for logs and send reports.
    fn name(&self) -> &str;

    fn send(&self, product: &Product) -> Result<(), SendError>;
}
