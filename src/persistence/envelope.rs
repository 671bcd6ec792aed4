//! Versioned JSON envelope
//!
//! On disk every document is `{ "version": N, "data": ... }`. Writes go to a
//! temp file that is renamed over the target after the previous target has
//! been rotated to `*.bak`. A document without the envelope is a legacy flat
//! save and reads as version 0.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::PersistenceError;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct Envelope<'a, T> {
    version: u32,
    data: &'a T,
}

pub fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("bak")
}

fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}

/// Write `data` wrapped in the current envelope
pub fn write_document<T: Serialize>(path: &Path, data: &T) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&Envelope {
        version: CURRENT_VERSION,
        data,
    })?;

    let tmp = temp_path(path);
    fs::write(&tmp, json)?;
    if path.exists() {
        fs::rename(path, backup_path(path))?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Parse one file. Returns the payload and the version it was stored with.
fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<(T, u32), PersistenceError> {
    if !path.exists() {
        return Err(PersistenceError::Missing(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)?;
    let mut value: serde_json::Value = serde_json::from_str(&raw)?;

    let version = value.get("version").and_then(|v| v.as_u64());
    let data = value.as_object_mut().and_then(|o| o.remove("data"));
    match (version, data) {
        (Some(version), Some(data)) => {
            let version = u32::try_from(version).unwrap_or(u32::MAX);
            if version > CURRENT_VERSION {
                return Err(PersistenceError::UnsupportedVersion(version));
            }
            Ok((serde_json::from_value(data)?, version))
        }
        (version, data) => {
            // Legacy flat document: put back anything we took out
            if let (Some(obj), Some(data)) = (value.as_object_mut(), data) {
                obj.insert("data".to_string(), data);
            }
            if version.is_some() {
                warn!("{} has a version but no data; reading as legacy", path.display());
            }
            Ok((serde_json::from_value(value)?, 0))
        }
    }
}

/// Read a document, falling back to its backup when the main file is
/// missing or unreadable
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<(T, u32), PersistenceError> {
    match parse_file(path) {
        Ok(doc) => Ok(doc),
        Err(primary) => {
            let backup = backup_path(path);
            if !backup.exists() {
                return Err(primary);
            }
            if !matches!(primary, PersistenceError::Missing(_)) {
                warn!("{} unreadable ({primary}); trying backup", path.display());
            }
            parse_file(&backup)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize, Default)]
    #[serde(default)]
    struct Doc {
        currency: u32,
        name: String,
    }

    #[test]
    fn test_write_wraps_in_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/doc.json");
        let doc = Doc {
            currency: 7,
            name: "a".into(),
        };
        write_document(&path, &doc).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["data"]["currency"], 7);
        assert!(!temp_path(&path).exists());

        let (back, version): (Doc, u32) = read_document(&path).unwrap();
        assert_eq!(back, doc);
        assert_eq!(version, 1);
    }

    #[test]
    fn test_second_write_rotates_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_document(&path, &Doc { currency: 1, ..Doc::default() }).unwrap();
        write_document(&path, &Doc { currency: 2, ..Doc::default() }).unwrap();
        let (bak, _): (Doc, u32) = parse_file(&backup_path(&path)).unwrap();
        assert_eq!(bak.currency, 1);
    }

    #[test]
    fn test_corrupt_main_falls_back_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_document(&path, &Doc { currency: 1, ..Doc::default() }).unwrap();
        write_document(&path, &Doc { currency: 2, ..Doc::default() }).unwrap();
        fs::write(&path, "{ truncated").unwrap();
        let (doc, _): (Doc, u32) = read_document(&path).unwrap();
        assert_eq!(doc.currency, 1);
    }

    #[test]
    fn test_legacy_flat_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, r#"{"currency": 12, "name": "old"}"#).unwrap();
        let (doc, version): (Doc, u32) = read_document(&path).unwrap();
        assert_eq!(doc.currency, 12);
        assert_eq!(version, 0);
    }

    #[test]
    fn test_future_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, r#"{"version": 9, "data": {}}"#).unwrap();
        assert!(matches!(
            read_document::<Doc>(&path),
            Err(PersistenceError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_document::<Doc>(&dir.path().join("none.json")),
            Err(PersistenceError::Missing(_))
        ));
    }
}
