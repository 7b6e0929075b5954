//! Corpus storage: load the existing array, append a batch, publish the result.
//!
//! The file is only ever replaced whole. Writes land in a sibling temp file
//! that is renamed over the target, so a failed write leaves the previous
//! corpus in place.
use crate::error::CorpusReadError;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Load the stored corpus; a missing file is an empty corpus.
pub fn load_corpus(path: &Path) -> Result<Vec<Value>, CorpusReadError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "corpus not found, starting empty");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.into()),
    };
    let value: Value = serde_json::from_slice(&bytes)?;
    match value {
        Value::Array(records) => {
            tracing::info!(path = %path.display(), records = records.len(), "corpus loaded");
            Ok(records)
        }
        other => Err(CorpusReadError::NotArray {
            found: json_type_name(&other),
        }),
    }
}

/// Existing records first, then the new batch, both in their original order.
pub fn append_records(existing: Vec<Value>, batch: Vec<Value>) -> Vec<Value> {
    let mut combined = existing;
    combined.extend(batch);
    combined
}

/// Replace the corpus file with `records` as pretty-printed JSON.
pub fn write_corpus(path: &Path, records: &[Value]) -> io::Result<()> {
    let mut bytes = serde_json::to_vec_pretty(records).map_err(io::Error::other)?;
    bytes.push(b'\n');

    // Write through a symlinked corpus to the file the loader read.
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(err) if err.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(err) => return Err(err),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".gamedex-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    match fs::metadata(&target) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            set_default_permissions(tmp.as_file())?
        }
        Err(err) => return Err(err),
    }
    tmp.persist(&target).map_err(|err| err.error)?;
    tracing::info!(path = %path.display(), records = records.len(), "corpus written");
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
