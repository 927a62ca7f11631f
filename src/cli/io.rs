//! JSON I/O handling for CLI
//!
//! - Input: one JSON document via stdin (validate without --payload)
//! - Output: one JSON response object via stdout
//! - Record files: `<data_dir>/records/<entity_id>.json`, an array of payload objects

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::api::Response;
use crate::storage::Record;

use super::errors::{CliError, CliResult};

/// Read a JSON document from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::InvalidArgument("Empty input on stdin".into()));
    }

    Ok(serde_json::from_str(&input)?)
}

/// Write a response envelope to stdout
pub fn write_response(response: &Response) -> CliResult<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", response.to_json())?;
    stdout.flush()?;
    Ok(())
}

/// Load the stored payloads of one entity as records.
///
/// A missing file means the entity has no records yet. Creation times follow
/// file order so unsorted queries return records as written.
pub fn load_records(data_dir: &Path, entity_id: Uuid) -> CliResult<Vec<Record>> {
    let path = data_dir.join("records").join(format!("{}.json", entity_id));
    if !path.exists() {
        debug!(path = %path.display(), "No record file");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CliError::Data(format!("Failed to read {:?}: {}", path, e)))?;
    let documents: Vec<Value> = serde_json::from_str(&content)
        .map_err(|e| CliError::Data(format!("Invalid record file {:?}: {}", path, e)))?;

    let loaded_at = Utc::now();
    documents
        .into_iter()
        .enumerate()
        .map(|(i, document)| match document {
            Value::Object(payload) => {
                let mut record = Record::new(entity_id, payload);
                record.created_at = loaded_at + Duration::milliseconds(i as i64);
                record.updated_at = record.created_at;
                Ok(record)
            }
            _ => Err(CliError::Data(format!(
                "Record {} in {:?} is not a JSON object",
                i, path
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_record_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let records = load_records(temp_dir.path(), Uuid::new_v4()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_records() {
        let temp_dir = TempDir::new().unwrap();
        let entity_id = Uuid::new_v4();
        let dir = temp_dir.path().join("records");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{}.json", entity_id)),
            json!([{"name": "a"}, {"name": "b"}]).to_string(),
        )
        .unwrap();

        let records = load_records(temp_dir.path(), entity_id).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.entity_id == entity_id));
        assert!(records[0].created_at < records[1].created_at);
    }

    #[test]
    fn test_non_object_record_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let entity_id = Uuid::new_v4();
        let dir = temp_dir.path().join("records");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.json", entity_id)), "[1]").unwrap();

        let err = load_records(temp_dir.path(), entity_id).unwrap_err();
        assert!(matches!(err, CliError::Data(_)));
    }
}
