//! Raw event loading.
//!
//! Three layouts are accepted: a JSON array of events, an engine log object
//! with `errors` / `warnings` / `infos` arrays, or JSON Lines.

use std::fmt;
use std::path::Path;

use serde_json::Value;
use xbrl_model::{RawEvent, Severity};

use crate::error::{IngestError, Result};

const BUCKETS: [(&str, Severity); 3] = [
    ("errors", Severity::Error),
    ("warnings", Severity::Warning),
    ("infos", Severity::Info),
];

pub(crate) fn read_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| IngestError::read(path, e))
}

/// An input entry that could not be read as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    /// 1-based position among the entries of the file.
    pub position: usize,
    /// 1-based line, for JSON Lines input.
    pub line: Option<usize>,
    pub reason: String,
}

impl fmt::Display for SkippedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.reason),
            None => write!(f, "entry {}: {}", self.position, self.reason),
        }
    }
}

/// Events read from one file plus the entries that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBatch {
    pub events: Vec<RawEvent>,
    pub skipped: Vec<SkippedEvent>,
}

impl EventBatch {
    fn push(
        &mut self,
        position: usize,
        line: Option<usize>,
        parsed: serde_json::Result<RawEvent>,
    ) {
        match parsed {
            Ok(event) => self.events.push(event),
            Err(err) => self.skipped.push(SkippedEvent {
                position,
                line,
                reason: err.to_string(),
            }),
        }
    }
}

/// Malformed entries are skipped and reported in the batch; only an
/// unreadable file or an unrecognized layout fails the load.
pub fn load_events(path: &Path) -> Result<EventBatch> {
    let text = read_text(path)?;
    let batch = parse_events(&text, path)?;
    if !batch.skipped.is_empty() {
        tracing::warn!(
            path = %path.display(),
            skipped = batch.skipped.len(),
            first = %batch.skipped[0],
            "skipped malformed events"
        );
    }
    tracing::debug!(path = %path.display(), events = batch.events.len(), "loaded raw events");
    Ok(batch)
}

pub fn parse_events(text: &str, path: &Path) -> Result<EventBatch> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(EventBatch::default());
    }
    let is_jsonl = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));
    if !is_jsonl && let Ok(document) = serde_json::from_str::<Value>(trimmed) {
        return events_from_document(document, path);
    }
    Ok(parse_lines(trimmed))
}

fn events_from_document(document: Value, path: &Path) -> Result<EventBatch> {
    let mut batch = EventBatch::default();
    match document {
        Value::Array(items) => {
            for (idx, item) in items.into_iter().enumerate() {
                batch.push(idx + 1, None, serde_json::from_value(item));
            }
        }
        Value::Object(mut log) if BUCKETS.iter().any(|(key, _)| log.contains_key(*key)) => {
            let mut position = 0;
            for (key, severity) in BUCKETS {
                let Some(Value::Array(items)) = log.remove(key) else {
                    continue;
                };
                for mut item in items {
                    position += 1;
                    if let Value::Object(fields) = &mut item
                        && !fields.contains_key("severity")
                        && !fields.contains_key("level")
                    {
                        fields.insert("severity".to_string(), Value::from(severity.as_str()));
                    }
                    batch.push(position, None, serde_json::from_value(item));
                }
            }
        }
        Value::Object(single) => batch.push(1, None, serde_json::from_value(Value::Object(single))),
        _ => {
            return Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "expected an array, an engine log object, or JSON lines".to_string(),
            });
        }
    }
    Ok(batch)
}

fn parse_lines(text: &str) -> EventBatch {
    let mut batch = EventBatch::default();
    let lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    for (position, (idx, line)) in lines.enumerate() {
        batch.push(position + 1, Some(idx + 1), serde_json::from_str(line));
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array() {
        let events = parse_events(
            r#"[{"code":"xbrl.5.2.5.2:calcInconsistency","message":"calc","severity":"error"}]"#,
            Path::new("events.json"),
        )
        .unwrap()
        .events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].code, "xbrl.5.2.5.2:calcInconsistency");
    }

    #[test]
    fn bucket_supplies_missing_severity() {
        let events = parse_events(
            r#"{"errors":[{"code":"a","message":"x"}],"warnings":[{"code":"b","message":"y"}]}"#,
            Path::new("log.json"),
        )
        .unwrap()
        .events;
        assert_eq!(events[0].severity, Severity::Error);
        assert_eq!(events[1].severity, Severity::Warning);
    }

    #[test]
    fn parses_json_lines() {
        let text = "{\"code\":\"a\",\"message\":\"x\",\"severity\":\"info\"}\n\n{\"code\":\"b\",\"message\":\"y\",\"severity\":\"warning\"}\n";
        let events = parse_events(text, Path::new("events.json")).unwrap().events;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].severity, Severity::Warning);
    }

    #[test]
    fn bad_line_is_skipped_and_its_neighbours_kept() {
        let text = concat!(
            r#"{"code":"a","message":"x"}"#,
            "\n",
            r#"{"code":"b","refs":"r1"}"#,
            "\n",
            r#"{"code":"c","message":"z"}"#,
            "\n{broken\n",
        );
        let batch = parse_events(text, Path::new("events.jsonl")).unwrap();
        let codes: Vec<&str> = batch.events.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, ["a", "c"]);
        let lines: Vec<Option<usize>> = batch.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, [Some(2), Some(4)]);
        assert!(batch.skipped[0].to_string().starts_with("line 2: "));
    }

    #[test]
    fn bad_array_item_is_skipped() {
        let batch = parse_events(
            r#"[{"code":"a","message":"x"},{"code":"b","message":null,"refs":7},{"code":"c","message":null}]"#,
            Path::new("events.json"),
        )
        .unwrap();
        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.events[1].code, "c");
        assert_eq!(batch.events[1].raw_message, "");
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].position, 2);
        assert_eq!(batch.skipped[0].line, None);
    }

    #[test]
    fn scalar_document_is_unsupported() {
        let err = parse_events("42", Path::new("events.json")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
    }

    #[test]
    fn empty_input_is_empty() {
        let batch = parse_events("  \n", Path::new("e.json")).unwrap();
        assert!(batch.events.is_empty());
        assert!(batch.skipped.is_empty());
    }
}
