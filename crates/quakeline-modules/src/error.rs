//! Error type for product summary extraction.

/// Errors raised when a product cannot be summarized.
///
/// An extraction failure rejects the product: no event is mutated and no
/// change records are emitted.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// A product id field that must be non-empty was empty.
    #[error("product id has an empty {0} field")]
    EmptyIdField(&'static str),

    /// A property required by the extracting module was absent.
    #[error("missing required property: {0}")]
    MissingProperty(&'static str),

    /// A property value could not be parsed.
    #[error("malformed property {name}: {value:?}")]
    MalformedProperty { name: String, value: String },

    /// A trump product named no trumped id.
    #[error("trump product carries no association to a trumped id")]
    MissingTrumpTarget,
}
