//! Change records emitted by the correlation engine.

use serde::{Deserialize, Serialize};

use quakeline_types::{Event, ProductSummary};

/// The kind of state transition one change record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexerChangeType {
    /// A product started a new event.
    #[serde(rename = "EVENT_ADDED")]
    EventAdded,
    /// An existing event gained, replaced, or withdrew a summary.
    #[serde(rename = "EVENT_UPDATED")]
    EventUpdated,
    /// An event's last live series was withdrawn.
    #[serde(rename = "EVENT_DELETED")]
    EventDeleted,
    /// An event was absorbed into another during a merge.
    #[serde(rename = "EVENT_MERGED")]
    EventMerged,
    /// A disconnected component was split off into a new event.
    #[serde(rename = "EVENT_SPLIT")]
    EventSplit,
    /// An old event was removed by the archival policy.
    #[serde(rename = "EVENT_ARCHIVED")]
    EventArchived,
}

impl IndexerChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EventAdded => "EVENT_ADDED",
            Self::EventUpdated => "EVENT_UPDATED",
            Self::EventDeleted => "EVENT_DELETED",
            Self::EventMerged => "EVENT_MERGED",
            Self::EventSplit => "EVENT_SPLIT",
            Self::EventArchived => "EVENT_ARCHIVED",
        }
    }
}

impl std::fmt::Display for IndexerChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable state transition.
///
/// `original_event` is the state the transition started from: the absorbed
/// event for a merge, the merged-but-not-yet-partitioned event for a split,
/// and the pre-update event otherwise. `new_event` is the committed state
/// afterwards. Either side may be absent: an EVENT_ADDED has no original, an
/// EVENT_DELETED or EVENT_ARCHIVED has no new state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerChange {
    #[serde(rename = "type")]
    pub change_type: IndexerChangeType,
    pub original_event: Option<Event>,
    pub new_event: Option<Event>,
}

impl IndexerChange {
    pub fn new(
        change_type: IndexerChangeType,
        original_event: Option<Event>,
        new_event: Option<Event>,
    ) -> Self {
        Self {
            change_type,
            original_event,
            new_event,
        }
    }
}

/// The unit of notification: one committed resolution.
///
/// `summary` is the triggering product's summary; it is absent for archival
/// sweeps, which are policy-driven rather than product-driven. `changes`
/// order is significant: merges precede the update that added the product,
/// splits follow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerEvent {
    pub summary: Option<ProductSummary>,
    pub changes: Vec<IndexerChange>,
}
