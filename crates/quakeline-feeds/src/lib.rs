//! Consumer-facing projection of indexed events.
//!
//! Turns internal [`quakeline_types::Event`] state and committed
//! [`quakeline_indexer::IndexerEvent`] change records into the GeoJSON
//! shapes downstream feeds consume. Everything here is a pure function of
//! already-committed state; nothing reads the index.

mod geojson;
mod listener;
mod summary;

pub use geojson::{render_change, render_event, render_indexer_event};
pub use listener::JsonLinesFeed;
pub use summary::EventSummary;
