//! Error types for the persisted index.

/// Errors that can occur during product index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A database operation failed.
    #[error("index database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An operation referenced an event id not present in the index.
    #[error("unknown event: {0}")]
    UnknownEvent(i64),

    /// A stored row could not be mapped back to a domain value.
    #[error("corrupt index row: {0}")]
    Corrupt(String),
}
