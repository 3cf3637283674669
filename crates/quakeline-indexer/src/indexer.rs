//! Product resolution: associate, merge, split, commit, notify.

use std::sync::{Mutex, PoisonError};

use rusqlite::Connection;
use tracing::{debug, info};

use quakeline_db::DbPool;
use quakeline_index::{
    add_event, add_summary, delete_event, events_older_than, get_event, get_events_for_keys,
    has_product, merge_events, split_summaries, IndexError,
};
use quakeline_modules::{ExtractionError, ModuleRegistry};
use quakeline_types::{Event, Product, ProductSummary};

use crate::changes::{IndexerChange, IndexerChangeType, IndexerEvent};
use crate::dispatch::{IndexerListener, ListenerSet};
use crate::graph::partition_components;

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("product extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("index operation failed: {0}")]
    Index(#[from] IndexError),
    #[error("database pool unavailable: {0}")]
    Pool(#[from] r2d2::Error),
}

impl From<rusqlite::Error> for IndexerError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Index(IndexError::Database(err))
    }
}

struct IndexerState {
    pool: DbPool,
    registry: ModuleRegistry,
    listeners: ListenerSet,
}

/// The correlation engine.
///
/// One incoming product is resolved at a time: candidate lookup, survivor
/// selection, merges, insertion, and splits all happen against a consistent
/// view, inside one transaction. Either every mutation of a resolution is
/// committed or none is, and listeners only ever see committed state.
pub struct Indexer {
    state: Mutex<IndexerState>,
}

impl Indexer {
    pub fn new(pool: DbPool, registry: ModuleRegistry) -> Self {
        Self {
            state: Mutex::new(IndexerState {
                pool,
                registry,
                listeners: ListenerSet::new(),
            }),
        }
    }

    /// Registers a listener for committed change notifications.
    ///
    /// Must be called from within a tokio runtime; delivery runs on a
    /// dedicated task per listener.
    pub fn add_listener(&self, listener: Box<dyn IndexerListener>) {
        let mut state = self.lock_state();
        state.listeners.add(listener);
    }

    /// Resolves one incoming product against the index.
    ///
    /// Returns the committed change records, in order. A re-delivered
    /// product revision yields an empty change list and notifies nobody.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError::Extraction`] when no module can summarize the
    /// product, and [`IndexerError::Index`] or [`IndexerError::Pool`] on
    /// storage failure. On error nothing was committed and nothing was
    /// dispatched, so the caller may safely retry.
    pub fn on_product(&self, product: &Product) -> Result<IndexerEvent, IndexerError> {
        let state = self.lock_state();

        let summary = state.registry.summarize(product)?;
        let mut conn = state.pool.get()?;
        let tx = conn.transaction()?;

        if has_product(&tx, &summary.id)? {
            debug!(product = %summary.id, "duplicate product, ignoring");
            return Ok(IndexerEvent {
                summary: Some(summary),
                changes: Vec::new(),
            });
        }

        let candidates = get_events_for_keys(&tx, &summary.connected_keys())?;
        let changes = if candidates.is_empty() {
            Self::resolve_new_event(&tx, &summary)?
        } else {
            Self::resolve_association(&tx, &summary, candidates)?
        };
        tx.commit()?;

        info!(
            product = %summary.id,
            changes = %describe_changes(&changes),
            "product indexed"
        );

        let result = IndexerEvent {
            summary: Some(summary),
            changes,
        };
        if !result.changes.is_empty() {
            state.listeners.dispatch(result.clone());
        }
        Ok(result)
    }

    /// Removes every event whose most recent update predates the cutoff
    /// (epoch milliseconds), emitting one EVENT_ARCHIVED record each.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError::Index`] or [`IndexerError::Pool`] on storage
    /// failure; nothing is committed or dispatched on error.
    pub fn archive(&self, cutoff_ms: i64) -> Result<IndexerEvent, IndexerError> {
        let state = self.lock_state();

        let mut conn = state.pool.get()?;
        let tx = conn.transaction()?;

        let stale = events_older_than(&tx, cutoff_ms)?;
        let mut changes = Vec::with_capacity(stale.len());
        for event in stale {
            delete_event(&tx, event.index_id)?;
            changes.push(IndexerChange::new(
                IndexerChangeType::EventArchived,
                Some(event),
                None,
            ));
        }
        tx.commit()?;

        if !changes.is_empty() {
            info!(count = changes.len(), cutoff_ms, "archived stale events");
        }

        let result = IndexerEvent {
            summary: None,
            changes,
        };
        if !result.changes.is_empty() {
            state.listeners.dispatch(result.clone());
        }
        Ok(result)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, IndexerState> {
        // A panic while holding the lock leaves committed state consistent;
        // keep serving.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_new_event(
        tx: &Connection,
        summary: &ProductSummary,
    ) -> Result<Vec<IndexerChange>, IndexerError> {
        let event_id = add_event(tx)?;
        add_summary(tx, event_id, summary)?;
        let event = load_event(tx, event_id)?;
        Ok(vec![IndexerChange::new(
            IndexerChangeType::EventAdded,
            None,
            Some(event),
        )])
    }

    fn resolve_association(
        tx: &Connection,
        summary: &ProductSummary,
        candidates: Vec<Event>,
    ) -> Result<Vec<IndexerChange>, IndexerError> {
        let survivor_id = choose_survivor(&candidates);
        let mut survivor_before = None;
        let mut absorbed_before = Vec::new();
        for candidate in candidates {
            if candidate.index_id == survivor_id {
                survivor_before = Some(candidate);
            } else {
                absorbed_before.push(candidate);
            }
        }
        let survivor_before =
            survivor_before.ok_or(IndexError::UnknownEvent(survivor_id))?;

        for absorbed in &absorbed_before {
            merge_events(tx, survivor_id, absorbed.index_id)?;
        }
        add_summary(tx, survivor_id, summary)?;

        // Merging and withdrawing can both sever edges; anything no longer
        // reachable from the surviving component becomes its own event.
        let merged = load_event(tx, survivor_id)?;
        let components = partition_components(&merged);
        let mut split_ids = Vec::new();
        for component in &components[1..] {
            split_ids.push(split_summaries(tx, component)?);
        }

        let survivor_after = load_event(tx, survivor_id)?;

        let mut changes = Vec::new();
        for absorbed in absorbed_before {
            changes.push(IndexerChange::new(
                IndexerChangeType::EventMerged,
                Some(absorbed),
                Some(survivor_after.clone()),
            ));
        }
        if survivor_after.is_deleted() {
            changes.push(IndexerChange::new(
                IndexerChangeType::EventDeleted,
                Some(survivor_before.clone()),
                None,
            ));
        } else {
            changes.push(IndexerChange::new(
                IndexerChangeType::EventUpdated,
                Some(survivor_before.clone()),
                Some(survivor_after),
            ));
        }
        // A split's original is the merged state the component left, not the
        // survivor's pre-resolution state; summaries that arrived via a merge
        // in this same resolution are part of what split apart.
        for split_id in split_ids {
            let split_event = load_event(tx, split_id)?;
            changes.push(IndexerChange::new(
                IndexerChangeType::EventSplit,
                Some(merged.clone()),
                Some(split_event),
            ));
        }
        Ok(changes)
    }
}

/// Picks which candidate keeps its internal id when several associate.
///
/// The event with the most preferred origin-bearing summary wins; events
/// without one rank below all that have one. Ties go to the oldest event
/// (lowest internal id), which keeps repeated replays deterministic.
fn choose_survivor(candidates: &[Event]) -> i64 {
    let mut best_id = candidates[0].index_id;
    let mut best_weight = origin_weight(&candidates[0]);
    for candidate in &candidates[1..] {
        let weight = origin_weight(candidate);
        if weight > best_weight || (weight == best_weight && candidate.index_id < best_id) {
            best_id = candidate.index_id;
            best_weight = weight;
        }
    }
    best_id
}

fn origin_weight(event: &Event) -> i64 {
    event
        .preferred_origin()
        .map(|s| s.preferred_weight)
        .unwrap_or(i64::MIN)
}

fn load_event(tx: &Connection, event_id: i64) -> Result<Event, IndexerError> {
    get_event(tx, event_id)?
        .ok_or(IndexerError::Index(IndexError::UnknownEvent(event_id)))
}

fn describe_changes(changes: &[IndexerChange]) -> String {
    changes
        .iter()
        .map(|c| c.change_type.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
