//! Completion manifest of a bulk-import file set.
//!
//! The manifest is the last thing an export writes. A directory without one
//! is a partial file set and must not be imported.

use crate::error::{ExportError, ExportResult};
use crate::layout::{FileKind, MANIFEST_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use synth_core::dataset::GenerationParams;

/// One data file listed in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name within the directory
    pub file: String,
    /// Node or relationship file
    pub kind: FileKind,
    /// Label or relationship type
    pub target: String,
    /// Data rows, header excluded
    pub rows: usize,
}

/// Manifest contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Graph schema version the files conform to
    pub schema_version: u32,
    /// Parameters the dataset was generated from
    pub params: GenerationParams,
    /// Data files, nodes first
    pub files: Vec<ManifestEntry>,
}

impl ExportManifest {
    /// Entry for `file`, if listed.
    pub fn entry(&self, file: &str) -> Option<&ManifestEntry> {
        self.files.iter().find(|e| e.file == file)
    }

    /// Total data rows across all files
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|e| e.rows).sum()
    }

    /// Path of every listed data file under `dir`.
    pub fn paths(&self, dir: &Path) -> Vec<PathBuf> {
        self.files.iter().map(|e| dir.join(&e.file)).collect()
    }

    /// Write the manifest into `dir` atomically: a temporary file is written
    /// first and renamed over the final name.
    pub fn write_to(&self, dir: &Path) -> ExportResult<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let tmp = dir.join(format!("{}.tmp", MANIFEST_FILE));
        let body = serde_json::to_vec_pretty(self).map_err(|source| ExportError::Manifest {
            path: path.clone(),
            source,
        })?;
        fs::write(&tmp, body).map_err(|e| ExportError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| ExportError::io(&path, e))?;
        Ok(path)
    }

    /// Read the manifest from `dir`.
    ///
    /// Fails with [`ExportError::MissingManifest`] when there is none.
    pub fn read_from(dir: &Path) -> ExportResult<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ExportError::MissingManifest(dir.to_path_buf()));
        }
        let body = fs::read(&path).map_err(|e| ExportError::io(&path, e))?;
        serde_json::from_slice(&body).map_err(|source| ExportError::Manifest { path, source })
    }

    /// Remove a manifest left by an earlier export, if any.
    pub fn remove_from(dir: &Path) -> ExportResult<()> {
        let path = dir.join(MANIFEST_FILE);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExportError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use synth_core::dataset::EntityCounts;
    use synth_core::schema::SCHEMA_VERSION;

    fn manifest() -> ExportManifest {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        ExportManifest {
            schema_version: SCHEMA_VERSION,
            params: GenerationParams::new(7, EntityCounts::default(), 0, as_of),
            files: vec![ManifestEntry {
                file: "issuers.csv".to_string(),
                kind: FileKind::Node,
                target: "Issuer".to_string(),
                rows: 3,
            }],
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let written = manifest();
        let path = written.write_to(dir.path()).unwrap();
        assert!(path.ends_with(MANIFEST_FILE));
        assert!(!dir.path().join("manifest.json.tmp").exists());

        let read = ExportManifest::read_from(dir.path()).unwrap();
        assert_eq!(read, written);
        assert_eq!(read.entry("issuers.csv").unwrap().rows, 3);
        assert_eq!(read.total_rows(), 3);
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExportManifest::read_from(dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::MissingManifest(_)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        manifest().write_to(dir.path()).unwrap();
        ExportManifest::remove_from(dir.path()).unwrap();
        ExportManifest::remove_from(dir.path()).unwrap();
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }
}
