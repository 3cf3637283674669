//! JSON-lines feed output.

use std::io::Write;
use std::sync::Mutex;

use quakeline_indexer::{IndexerEvent, IndexerListener, ListenerError};

use crate::geojson::render_indexer_event;

/// Listener that appends one JSON document per committed resolution to a
/// writer, newline-delimited.
///
/// The writer is flushed after every line so a tailing consumer sees each
/// resolution as soon as it is delivered.
pub struct JsonLinesFeed<W: Write + Send + 'static> {
    writer: Mutex<W>,
}

impl<W: Write + Send + 'static> JsonLinesFeed<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send + 'static> IndexerListener for JsonLinesFeed<W> {
    fn on_indexer_event(&self, event: &IndexerEvent) -> Result<(), ListenerError> {
        let line = render_indexer_event(event);
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ListenerError::new("feed writer poisoned"))?;
        writeln!(writer, "{line}").map_err(|e| ListenerError::new(e.to_string()))?;
        writer.flush().map_err(|e| ListenerError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quakeline_indexer::{IndexerChange, IndexerChangeType};
    use quakeline_types::{Event, ProductId, ProductStatus, ProductSummary};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_json_line_per_event() {
        let buffer = SharedBuffer::default();
        let feed = JsonLinesFeed::new(buffer.clone());

        let summary = ProductSummary {
            index_id: Some(1),
            id: ProductId::new("us", "origin", "us2024abcd", 1_000),
            status: ProductStatus::Update,
            preferred_weight: 101,
            properties: BTreeMap::new(),
            associated: Vec::new(),
            latitude: None,
            longitude: None,
            depth: None,
            magnitude: None,
            event_time: None,
            version: None,
        };
        let mut event = Event::new(1);
        event.summaries.push(summary.clone());
        let indexer_event = IndexerEvent {
            summary: Some(summary),
            changes: vec![IndexerChange::new(
                IndexerChangeType::EventAdded,
                None,
                Some(event),
            )],
        };

        feed.on_indexer_event(&indexer_event).expect("write");
        feed.on_indexer_event(&indexer_event).expect("write");

        let bytes = buffer.0.lock().unwrap().clone();
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(parsed["changes"][0]["type"], "EVENT_ADDED");
    }
}
