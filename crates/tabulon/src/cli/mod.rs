//! CLI module for tabulon
//!
//! Each subcommand works on a datapackage directory resolved from
//! `--base-path`, `TABULON_BASE_PATH` or the current directory.

pub mod argument;
pub mod config;
pub mod error;
pub mod execute;
pub mod output;
pub mod resource;
pub mod schema;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

/// Read row records from a JSON file, or stdin when `path` is `-`.
///
/// Accepts either a bare array of records or a resource-shaped object with a
/// `data` array.
pub fn read_records(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read records from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records: {}", path.display()))?
    };

    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    let rows = match value {
        Value::Object(mut object) => object.remove("data").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(rows)
        .with_context(|| format!("Expected an array of row objects in {}", path.display()))
}
