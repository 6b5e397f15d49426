//! Built-in producer daemons.
//!
//! Compiled into the hub binary and launched as `narrative-hub daemon
//! <kind>` when the daemons directory has no external producers. Each runs
//! as an ordinary child process speaking the line protocol: one JSON record
//! per stdout line, plain text for diagnostics.

pub mod chaos;
pub mod journal;
pub mod watcher;

use std::io::Write;

use serde_json::Value;

use crate::record::Record;

/// Print one record line, flushed so the hub sees it immediately.
fn emit(kind: &str, fields: Value) {
    let fields = match fields {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    let record = Record::now(kind, fields);
    match serde_json::to_string(&record) {
        Ok(line) => {
            println!("{line}");
            let _ = std::io::stdout().flush();
        }
        Err(e) => eprintln!("failed to serialize {kind}: {e}"),
    }
}
