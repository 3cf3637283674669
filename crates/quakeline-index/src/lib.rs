//! Persisted product index for the Quakeline platform.
//!
//! Durable, queryable storage of events and their product summaries over
//! SQLite. Every function here operates on a caller-supplied
//! [`rusqlite::Connection`]; the correlation engine wraps one `on_product`
//! resolution in a single transaction so a crash or concurrent read can
//! never observe a partially merged or partially split state.
//!
//! The schema (see `quakeline-db` migrations) keeps the full revision
//! history of every product series. Queries that feed correlation decisions
//! (candidate lookup, preferred-summary derivation) consider only the
//! latest revision of each series.

mod error;
mod store;

pub use error::IndexError;
pub use store::{
    add_event, add_summary, delete_event, events_older_than, get_event, get_events_for_keys,
    has_product, merge_events, split_summaries,
};
