//! Persistence operations for events and product summaries.
//!
//! Mutations here are building blocks; the correlation engine composes them
//! inside one transaction per incoming product. Reads used for correlation
//! (candidate lookup) match on the latest revision of each series, so a
//! superseded association cannot re-attract an event it no longer names.

use rusqlite::{params, Connection};
use std::str::FromStr;

use quakeline_types::{Event, EventKey, ProductId, ProductStatus, ProductSummary};

use crate::error::IndexError;

/// Whether this exact product revision is already indexed.
///
/// Used for duplicate suppression: re-delivery of an already-indexed
/// product must be a no-op.
///
/// # Errors
///
/// Returns `IndexError::Database` on SQL failure.
pub fn has_product(conn: &Connection, id: &ProductId) -> Result<bool, IndexError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM summaries
            WHERE source = ?1 AND type = ?2 AND code = ?3 AND update_time = ?4
         )",
        params![id.source, id.product_type, id.code, id.update_time],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Creates a new, empty event and returns its internal id.
///
/// # Errors
///
/// Returns `IndexError::Database` on SQL failure.
pub fn add_event(conn: &Connection) -> Result<i64, IndexError> {
    conn.execute("INSERT INTO events DEFAULT VALUES", [])?;
    Ok(conn.last_insert_rowid())
}

/// Loads an event with its full summary history, or `None` if the id is
/// unknown.
///
/// Summaries are returned in insertion order, which the audit trail relies
/// on; preference among them is derived, not positional.
///
/// # Errors
///
/// Returns `IndexError::Database` on SQL failure, or `IndexError::Corrupt`
/// if a stored row cannot be mapped back to a domain value.
pub fn get_event(conn: &Connection, event_id: i64) -> Result<Option<Event>, IndexError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
        params![event_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(None);
    }

    let mut event = Event::new(event_id);

    let mut stmt = conn.prepare(
        "SELECT id, source, type, code, update_time, status, preferred_weight,
                latitude, longitude, depth, magnitude, event_time, version
         FROM summaries WHERE event_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![event_id], |row| {
        let status_text: String = row.get(5)?;
        Ok((
            ProductSummary {
                index_id: Some(row.get(0)?),
                id: ProductId {
                    source: row.get(1)?,
                    product_type: row.get(2)?,
                    code: row.get(3)?,
                    update_time: row.get(4)?,
                },
                status: ProductStatus::Update,
                preferred_weight: row.get(6)?,
                properties: Default::default(),
                associated: Vec::new(),
                latitude: row.get(7)?,
                longitude: row.get(8)?,
                depth: row.get(9)?,
                magnitude: row.get(10)?,
                event_time: row.get(11)?,
                version: row.get(12)?,
            },
            status_text,
        ))
    })?;

    for row in rows {
        let (mut summary, status_text) = row?;
        summary.status = ProductStatus::from_str(&status_text)
            .map_err(|e| IndexError::Corrupt(e.to_string()))?;
        let summary_id = summary.index_id.unwrap_or_default();
        load_properties(conn, summary_id, &mut summary)?;
        load_associations(conn, summary_id, &mut summary)?;
        event.summaries.push(summary);
    }

    Ok(Some(event))
}

fn load_properties(
    conn: &Connection,
    summary_id: i64,
    summary: &mut ProductSummary,
) -> Result<(), IndexError> {
    let mut stmt =
        conn.prepare("SELECT name, value FROM summary_properties WHERE summary_id = ?1")?;
    let rows = stmt.query_map(params![summary_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (name, value) = row?;
        summary.properties.insert(name, value);
    }
    Ok(())
}

fn load_associations(
    conn: &Connection,
    summary_id: i64,
    summary: &mut ProductSummary,
) -> Result<(), IndexError> {
    let mut stmt = conn.prepare(
        "SELECT source, code FROM summary_associations WHERE summary_id = ?1
         ORDER BY source, code",
    )?;
    let rows = stmt.query_map(params![summary_id], |row| {
        Ok(EventKey {
            source: row.get(0)?,
            code: row.get(1)?,
        })
    })?;
    for row in rows {
        summary.associated.push(row?);
    }
    Ok(())
}

/// Finds all candidate events for a set of event keys.
///
/// An event is a candidate when any of its summaries' own `(source, code)`
/// matches one of the keys, or when the latest revision of any of its series
/// carries an association referencing one of the keys. Results are ordered
/// by internal event id, which makes downstream tie-breaking deterministic.
///
/// # Errors
///
/// Returns `IndexError::Database` on SQL failure.
pub fn get_events_for_keys(
    conn: &Connection,
    keys: &[EventKey],
) -> Result<Vec<Event>, IndexError> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    // Build parameterised OR clauses; nothing is interpolated.
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1u32;

    let mut own_clauses = Vec::new();
    for key in keys {
        own_clauses.push(format!("(s.source = ?{} AND s.code = ?{})", idx, idx + 1));
        param_values.push(Box::new(key.source.clone()));
        param_values.push(Box::new(key.code.clone()));
        idx += 2;
    }

    let mut assoc_clauses = Vec::new();
    for key in keys {
        assoc_clauses.push(format!("(a.source = ?{} AND a.code = ?{})", idx, idx + 1));
        param_values.push(Box::new(key.source.clone()));
        param_values.push(Box::new(key.code.clone()));
        idx += 2;
    }

    let sql = format!(
        "SELECT DISTINCT event_id FROM (
            SELECT s.event_id AS event_id FROM summaries s WHERE {own}
            UNION
            SELECT s.event_id AS event_id FROM summaries s
            JOIN summary_associations a ON a.summary_id = s.id
            WHERE ({assoc})
              AND s.update_time = (
                SELECT MAX(s2.update_time) FROM summaries s2
                WHERE s2.source = s.source AND s2.type = s.type AND s2.code = s.code
              )
         )
         ORDER BY event_id ASC",
        own = own_clauses.join(" OR "),
        assoc = assoc_clauses.join(" OR "),
    );

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| &**p).collect();

    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt.query_map(params_refs.as_slice(), |row| row.get::<_, i64>(0))?;

    let mut events = Vec::new();
    for id in ids {
        let id = id?;
        match get_event(conn, id)? {
            Some(event) => events.push(event),
            // Deleted via cascade mid-query cannot happen inside one
            // transaction; treat as corrupt rather than silently skipping.
            None => return Err(IndexError::UnknownEvent(id)),
        }
    }

    Ok(events)
}

/// Stores a summary under the given event and returns its index id.
///
/// # Errors
///
/// Returns `IndexError::UnknownEvent` if the event does not exist, or
/// `IndexError::Database` on SQL failure (including an attempt to store the
/// same product revision twice).
pub fn add_summary(
    conn: &Connection,
    event_id: i64,
    summary: &ProductSummary,
) -> Result<i64, IndexError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
        params![event_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(IndexError::UnknownEvent(event_id));
    }

    conn.execute(
        "INSERT INTO summaries
            (event_id, source, type, code, update_time, status, preferred_weight,
             latitude, longitude, depth, magnitude, event_time, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            event_id,
            summary.id.source,
            summary.id.product_type,
            summary.id.code,
            summary.id.update_time,
            summary.status.as_str(),
            summary.preferred_weight,
            summary.latitude,
            summary.longitude,
            summary.depth,
            summary.magnitude,
            summary.event_time,
            summary.version,
        ],
    )?;
    let summary_id = conn.last_insert_rowid();

    for (name, value) in &summary.properties {
        conn.execute(
            "INSERT INTO summary_properties (summary_id, name, value) VALUES (?1, ?2, ?3)",
            params![summary_id, name, value],
        )?;
    }
    for key in &summary.associated {
        conn.execute(
            "INSERT OR IGNORE INTO summary_associations (summary_id, source, code)
             VALUES (?1, ?2, ?3)",
            params![summary_id, key.source, key.code],
        )?;
    }

    Ok(summary_id)
}

/// Moves every summary of `absorbed` into `survivor` and removes the
/// absorbed event row.
///
/// # Errors
///
/// Returns `IndexError::UnknownEvent` if either event does not exist, or
/// `IndexError::Database` on SQL failure.
pub fn merge_events(conn: &Connection, survivor: i64, absorbed: i64) -> Result<(), IndexError> {
    for id in [survivor, absorbed] {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(IndexError::UnknownEvent(id));
        }
    }

    conn.execute(
        "UPDATE summaries SET event_id = ?1 WHERE event_id = ?2",
        params![survivor, absorbed],
    )?;
    conn.execute("DELETE FROM events WHERE id = ?1", params![absorbed])?;
    tracing::debug!(survivor, absorbed, "merged events");
    Ok(())
}

/// Moves the given summaries (by index id) into a freshly created event and
/// returns the new event's id.
///
/// Used when an event's association graph disconnects: each split-off
/// component becomes its own event.
///
/// # Errors
///
/// Returns `IndexError::Database` on SQL failure.
pub fn split_summaries(conn: &Connection, summary_ids: &[i64]) -> Result<i64, IndexError> {
    let new_event = add_event(conn)?;

    let placeholders: Vec<String> = (0..summary_ids.len())
        .map(|i| format!("?{}", i + 2))
        .collect();
    let sql = format!(
        "UPDATE summaries SET event_id = ?1 WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(new_event)];
    for id in summary_ids {
        param_values.push(Box::new(*id));
    }
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| &**p).collect();

    conn.execute(&sql, params_refs.as_slice())?;
    tracing::debug!(new_event, count = summary_ids.len(), "split summaries into new event");
    Ok(new_event)
}

/// Removes an event and, via cascade, its entire summary history.
///
/// This is the archival path; ordinary deletion keeps the event row as a
/// tombstone so the audit history and event id survive.
///
/// # Errors
///
/// Returns `IndexError::UnknownEvent` if the event does not exist, or
/// `IndexError::Database` on SQL failure.
pub fn delete_event(conn: &Connection, event_id: i64) -> Result<(), IndexError> {
    let removed = conn.execute("DELETE FROM events WHERE id = ?1", params![event_id])?;
    if removed == 0 {
        return Err(IndexError::UnknownEvent(event_id));
    }
    Ok(())
}

/// Loads every event whose most recent summary update is older than the
/// cutoff (epoch milliseconds).
///
/// # Errors
///
/// Returns `IndexError::Database` on SQL failure.
pub fn events_older_than(conn: &Connection, cutoff_ms: i64) -> Result<Vec<Event>, IndexError> {
    let mut stmt = conn.prepare(
        "SELECT e.id FROM events e
         WHERE (SELECT MAX(s.update_time) FROM summaries s WHERE s.event_id = e.id) < ?1
         ORDER BY e.id ASC",
    )?;
    let ids = stmt.query_map(params![cutoff_ms], |row| row.get::<_, i64>(0))?;

    let mut events = Vec::new();
    for id in ids {
        let id = id?;
        if let Some(event) = get_event(conn, id)? {
            events.push(event);
        }
    }
    Ok(events)
}
