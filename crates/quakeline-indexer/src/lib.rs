//! The Quakeline correlation engine.
//!
//! [`Indexer`] is the single orchestrator: given one incoming product it
//! extracts a summary through the type module registry, finds candidate
//! events in the persisted index, decides whether the product starts a new
//! event, joins one, merges several, or splits one apart, commits every
//! mutation atomically, and emits an ordered list of change records to
//! registered listeners.
//!
//! The algorithm is deliberately not safe for uncoordinated concurrent
//! writers: merge and split decisions depend on a consistent read of the
//! candidate set, so resolution is serialized behind a single mutex. It is
//! idempotent (re-delivering an already-indexed product yields an empty
//! change list), which makes "retry on unknown outcome" safe for callers.

mod changes;
mod dispatch;
mod graph;
mod indexer;

pub use changes::{IndexerChange, IndexerChangeType, IndexerEvent};
pub use dispatch::{IndexerListener, ListenerError};
pub use indexer::{Indexer, IndexerError};
