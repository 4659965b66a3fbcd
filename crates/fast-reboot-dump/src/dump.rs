//! Artifact records and atomic artifact writes
//!
//! Every artifact is a JSON array of objects of the form
//! `{"<table key>": {<fields>}, "OP": "SET"}`, with the table key first.

use crate::error::{DumpError, Result};
use crate::store::FieldMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// Operation member name
pub const OP_FIELD: &str = "OP";

/// The only operation ever written
pub const OP_SET: &str = "SET";

/// One artifact entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRecord {
    key: String,
    fields: FieldMap,
}

impl DumpRecord {
    pub fn new(key: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

impl Serialize for DumpRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.key, &self.fields)?;
        map.serialize_entry(OP_FIELD, OP_SET)?;
        map.end()
    }
}

/// Fails with [`DumpError::TargetDirNotFound`] unless `dir` is an existing directory
pub fn ensure_target_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(DumpError::TargetDirNotFound(dir.to_path_buf()))
    }
}

/// Writes `records` to `dir/file_name`.
///
/// The artifact is written to a temporary file in `dir` and renamed into
/// place, so a reader never observes a partially written file.
#[instrument(skip(records), fields(count = records.len()))]
pub fn write_artifact(dir: &Path, file_name: &str, records: &[DumpRecord]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(&path).map_err(|e| DumpError::Io(e.error))?;
    debug!(path = %path.display(), "Artifact written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(key: &str, pairs: &[(&str, &str)]) -> DumpRecord {
        DumpRecord::new(
            key,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_record_key_comes_first() {
        let rec = record(
            "FDB_TABLE:Vlan10:aa-bb-cc-dd-ee-ff",
            &[("type", "static"), ("port", "Ethernet0")],
        );
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(
            json,
            r#"{"FDB_TABLE:Vlan10:aa-bb-cc-dd-ee-ff":{"port":"Ethernet0","type":"static"},"OP":"SET"}"#
        );
    }

    #[test]
    fn test_record_empty_fields() {
        let rec = record("ARP_TABLE:x", &[]);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"ARP_TABLE:x":{},"OP":"SET"}"#);
    }

    #[test]
    fn test_write_artifact_pretty() {
        let dir = TempDir::new().unwrap();
        let records = vec![record("ROUTE_TABLE:0.0.0.0/0", &[("nexthop", "10.0.0.1")])];

        let path = write_artifact(dir.path(), "default_routes.json", &records).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "[\n  {\n    \"ROUTE_TABLE:0.0.0.0/0\": {\n      \"nexthop\": \"10.0.0.1\"\n    },\n    \"OP\": \"SET\"\n  }\n]"
        );

        // Only the artifact remains, no temp files
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_empty_artifact() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path(), "arp.json", &[]).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }

    #[test]
    fn test_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fdb.json"), "stale").unwrap();

        write_artifact(dir.path(), "fdb.json", &[]).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("fdb.json")).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_ensure_target_dir() {
        let dir = TempDir::new().unwrap();
        assert!(ensure_target_dir(dir.path()).is_ok());

        let missing = dir.path().join("missing");
        let err = ensure_target_dir(&missing).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_TARGET_NOT_FOUND);
    }
}
