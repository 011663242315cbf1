//! Initial document load and write with optional JSON Schema validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::{Map, Value};
use tracing::debug;

use super::write_atomic;

/// Load a state document from disk, validating it against `schema` if given.
///
/// The document root must be a mapping.
pub fn load_document(path: &Path, schema: Option<&Path>) -> Result<Map<String, Value>> {
    debug!(path = %path.display(), "loading document");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read document {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse document {}", path.display()))?;
    if let Some(schema_path) = schema {
        validate_schema(schema_path, &value)
            .with_context(|| format!("validate document {}", path.display()))?;
    }
    match value {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!(
            "document {} must be a JSON object at the root, found {}",
            path.display(),
            type_name(&other)
        )),
    }
}

/// Write a document as pretty JSON, replacing any existing file atomically.
pub fn write_document(path: &Path, document: &Map<String, Value>) -> Result<()> {
    debug!(path = %path.display(), keys = document.len(), "writing document");
    let mut buf = serde_json::to_string_pretty(document).context("serialize document")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn validate_schema(schema_path: &Path, document: &Value) -> Result<()> {
    let schema_contents = fs::read_to_string(schema_path)
        .with_context(|| format!("read schema {}", schema_path.display()))?;
    let schema_value: Value = serde_json::from_str(&schema_contents)
        .with_context(|| format!("parse schema {}", schema_path.display()))?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(document) {
        let messages = compiled
            .iter_errors(document)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "document schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
