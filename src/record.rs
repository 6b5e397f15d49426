//! The record contract shared by producers and the hub.
//!
//! Producers emit one JSON object per line on their output stream. Every
//! record carries a `type` tag and an ISO-8601 `timestamp`; any other keys
//! are type-specific and pass through the hub opaquely. Lines that do not
//! begin with `{` are plain diagnostics meant for operator logs, never for
//! viewers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured event unit flowing from a producer to viewers.
///
/// Immutable after creation. The hub never inspects `fields`; they are
/// serialized back out exactly as they arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record kind, e.g. `chaos_rename` or `journal_entry`.
    #[serde(rename = "type")]
    pub kind: String,
    /// ISO-8601 timestamp set by the producer at creation time.
    pub timestamp: String,
    /// Type-specific payload, opaque to the hub.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record stamped with the current local time.
    pub fn now(kind: &str, fields: Map<String, Value>) -> Self {
        Self {
            kind: kind.to_string(),
            timestamp: local_timestamp(),
            fields,
        }
    }
}

/// Classification of one raw line read from a producer's output stream.
#[derive(Debug)]
pub enum ProducerLine {
    /// Whitespace-only line.
    Empty,
    /// Plain diagnostic text (no leading `{`) - operator logs only.
    Diagnostic(String),
    /// A well-formed record.
    Record(Record),
    /// A `{`-line that failed to parse as a record.
    Malformed(serde_json::Error),
}

impl ProducerLine {
    /// Classify a raw producer output line.
    ///
    /// The line is trimmed first. A missing `type` or `timestamp` key is a
    /// parse failure, not a diagnostic - the contract requires both.
    pub fn parse(raw: &str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('{') {
            return Self::Diagnostic(line.to_string());
        }
        match serde_json::from_str::<Record>(line) {
            Ok(record) => Self::Record(record),
            Err(e) => Self::Malformed(e),
        }
    }
}

/// Current local time formatted like Python's `datetime.isoformat()`,
/// which is what the original daemons emit.
pub fn local_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Convert a filesystem timestamp to the same ISO-8601 shape.
pub fn system_time_iso(time: std::time::SystemTime) -> String {
    chrono::DateTime::<chrono::Local>::from(time)
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// First `max` characters of a line, for log excerpts of bad input.
pub fn excerpt(line: &str, max: usize) -> String {
    line.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_record_with_extra_fields() {
        let line = r#"{"type":"chaos_rename","old_name":"notes.txt","new_name":"IMPORTANT_notes.txt","timestamp":"2024-01-01T00:00:00"}"#;
        match ProducerLine::parse(line) {
            ProducerLine::Record(record) => {
                assert_eq!(record.kind, "chaos_rename");
                assert_eq!(record.timestamp, "2024-01-01T00:00:00");
                assert_eq!(record.fields["old_name"], "notes.txt");
                assert_eq!(record.fields["new_name"], "IMPORTANT_notes.txt");
            }
            other => panic!("Expected Record, got: {other:?}"),
        }
    }

    #[test]
    fn test_parse_record_round_trips_exactly() {
        let line = r#"{"type":"chaos_open_file","timestamp":"2024-01-01T00:00:00","filename":"a.txt","count":3,"urgent":true}"#;
        let record = match ProducerLine::parse(line) {
            ProducerLine::Record(record) => record,
            other => panic!("Expected Record, got: {other:?}"),
        };
        let reserialized: Value = serde_json::to_value(&record).unwrap();
        let original: Value = serde_json::from_str(line).unwrap();
        assert_eq!(reserialized, original);
    }

    #[test]
    fn test_parse_diagnostic_line() {
        match ProducerLine::parse("Starting chaos daemon") {
            ProducerLine::Diagnostic(text) => assert_eq!(text, "Starting chaos daemon"),
            other => panic!("Expected Diagnostic, got: {other:?}"),
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        match ProducerLine::parse("  [CHAOS] ready  \n") {
            ProducerLine::Diagnostic(text) => assert_eq!(text, "[CHAOS] ready"),
            other => panic!("Expected Diagnostic, got: {other:?}"),
        }
        assert!(matches!(ProducerLine::parse("   \n"), ProducerLine::Empty));
    }

    #[test]
    fn test_parse_invalid_json_is_malformed() {
        assert!(matches!(
            ProducerLine::parse(r#"{"type": "broken"#),
            ProducerLine::Malformed(_)
        ));
    }

    #[test]
    fn test_parse_missing_required_keys_is_malformed() {
        // No timestamp
        assert!(matches!(
            ProducerLine::parse(r#"{"type":"chaos_rename"}"#),
            ProducerLine::Malformed(_)
        ));
        // No type
        assert!(matches!(
            ProducerLine::parse(r#"{"timestamp":"2024-01-01T00:00:00"}"#),
            ProducerLine::Malformed(_)
        ));
        // Wrong type for the tag
        assert!(matches!(
            ProducerLine::parse(r#"{"type":7,"timestamp":"2024-01-01T00:00:00"}"#),
            ProducerLine::Malformed(_)
        ));
    }

    #[test]
    fn test_record_now_stamps_timestamp() {
        let record = Record::now("journal_entry", Map::new());
        assert_eq!(record.kind, "journal_entry");
        // 2024-01-01T00:00:00.000000 shape: date, 'T', time
        assert!(record.timestamp.contains('T'), "got: {}", record.timestamp);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("abcdef", 3), "abc");
        assert_eq!(excerpt("héllo wörld", 4), "héll");
        assert_eq!(excerpt("ab", 50), "ab");
    }
}
