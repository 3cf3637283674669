//! GeoJSON rendering of events and change records.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::{json, Map, Value};

use quakeline_indexer::{IndexerChange, IndexerChangeType, IndexerEvent};
use quakeline_types::{Event, ProductSummary};

use crate::summary::EventSummary;

/// Renders an event as a GeoJSON Feature.
pub fn render_event(event: &Event) -> Value {
    let summary = EventSummary::new(event);

    let mut properties = Map::new();
    properties.insert("mag".into(), opt_f64(event.magnitude()));
    properties.insert("place".into(), opt_string(summary.title()));
    properties.insert("time".into(), opt_timestamp(event.time()));
    properties.insert("updated".into(), opt_timestamp(event.update_time()));
    properties.insert("felt".into(), opt_i64(summary.num_responses()));
    properties.insert("cdi".into(), opt_f64(summary.max_cdi()));
    properties.insert("mmi".into(), opt_f64(summary.max_mmi()));
    properties.insert("alert".into(), opt_string(summary.alert_level()));
    properties.insert("status".into(), Value::String(summary.review_status()));
    properties.insert("tsunami".into(), Value::Bool(summary.tsunami_link()));
    properties.insert("sig".into(), Value::from(summary.significance()));
    properties.insert("net".into(), opt_string(event.source()));
    properties.insert("code".into(), opt_string(event.source_code()));
    properties.insert("ids".into(), string_set(event.event_ids()));
    properties.insert("sources".into(), string_set(event.sources()));
    properties.insert("types".into(), string_set(event.types()));
    properties.insert("nst".into(), opt_i64(summary.num_stations_used()));
    properties.insert("dmin".into(), opt_f64(summary.minimum_distance()));
    properties.insert("gap".into(), opt_f64(summary.azimuthal_gap()));
    properties.insert("rms".into(), opt_f64(summary.standard_error()));
    properties.insert("magType".into(), opt_string(summary.magnitude_type()));
    properties.insert("type".into(), Value::String(summary.event_type()));

    json!({
        "type": "Feature",
        "id": opt_string(event.event_id()),
        "properties": Value::Object(properties),
        "geometry": {
            "type": "Point",
            "coordinates": [
                opt_f64(event.longitude()),
                opt_f64(event.latitude()),
                opt_f64(event.depth()),
            ],
        },
    })
}

/// Renders one change record.
///
/// Removal-style changes carry the state that went away under
/// `removedEvent`; everything else carries the committed state under
/// `event`.
pub fn render_change(change: &IndexerChange) -> Value {
    let removed = matches!(
        change.change_type,
        IndexerChangeType::EventDeleted
            | IndexerChangeType::EventMerged
            | IndexerChangeType::EventArchived
    );
    if removed {
        json!({
            "type": change.change_type.as_str(),
            "removedEvent": change.original_event.as_ref().map(render_event),
        })
    } else {
        json!({
            "type": change.change_type.as_str(),
            "event": change.new_event.as_ref().map(render_event),
        })
    }
}

/// Renders one committed resolution: the triggering product plus every
/// change, in commit order.
pub fn render_indexer_event(event: &IndexerEvent) -> Value {
    json!({
        "product": event.summary.as_ref().map(render_product),
        "changes": event.changes.iter().map(render_change).collect::<Vec<_>>(),
    })
}

fn render_product(summary: &ProductSummary) -> Value {
    json!({
        "source": summary.id.source,
        "type": summary.id.product_type,
        "code": summary.id.code,
        "updateTime": opt_timestamp(Some(summary.id.update_time)),
        "status": summary.status.as_str(),
    })
}

fn opt_timestamp(millis: Option<i64>) -> Value {
    millis
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::Millis, true)))
        .unwrap_or(Value::Null)
}

fn opt_string(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

fn opt_f64(value: Option<f64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn opt_i64(value: Option<i64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn string_set(values: std::collections::BTreeSet<String>) -> Value {
    Value::Array(values.into_iter().map(Value::String).collect())
}
