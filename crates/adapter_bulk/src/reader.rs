//! Re-parsing of an exported file set.
//!
//! Used to check a directory before handing it to the import tool: the
//! manifest must exist, every file must carry the expected header and row
//! count, and every relationship endpoint must resolve to a node.

use crate::error::{ExportError, ExportResult};
use crate::layout::BulkFile;
use crate::manifest::ExportManifest;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use synth_core::schema::{Label, RelType};
use tracing::debug;

/// Identifiers and endpoint pairs read back from a file set.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkImport {
    /// Manifest of the file set
    pub manifest: ExportManifest,
    /// Node identifiers per label, in file order
    pub keys: BTreeMap<Label, Vec<String>>,
    /// Relationship endpoints per type, in file order
    pub pairs: BTreeMap<RelType, Vec<(String, String)>>,
}

impl BulkImport {
    /// Identifiers of `label`
    pub fn keys(&self, label: Label) -> &[String] {
        self.keys.get(&label).map(Vec::as_slice).unwrap_or_default()
    }

    /// Endpoint pairs of `rel`
    pub fn pairs(&self, rel: RelType) -> &[(String, String)] {
        self.pairs.get(&rel).map(Vec::as_slice).unwrap_or_default()
    }

    /// Check identifier uniqueness per label and that every relationship
    /// endpoint names an existing node of the right label.
    pub fn check_references(&self, dir: &Path) -> ExportResult<()> {
        let mut key_sets: BTreeMap<Label, HashSet<&str>> = BTreeMap::new();
        for label in Label::ALL {
            let keys = self.keys(label);
            let set: HashSet<&str> = keys.iter().map(String::as_str).collect();
            if set.len() != keys.len() {
                return Err(ExportError::malformed(
                    dir.join(BulkFile::Nodes(label).file_name()),
                    format!("duplicate {} identifiers", label),
                ));
            }
            key_sets.insert(label, set);
        }

        for rel in RelType::ALL {
            let path = dir.join(BulkFile::Relationships(rel).file_name());
            let starts = &key_sets[&rel.start_label()];
            let ends = &key_sets[&rel.end_label()];
            for (line, (start, end)) in self.pairs(rel).iter().enumerate() {
                if !starts.contains(start.as_str()) {
                    return Err(ExportError::malformed(
                        &path,
                        format!("row {}: no {} with id {}", line + 1, rel.start_label(), start),
                    ));
                }
                if !ends.contains(end.as_str()) {
                    return Err(ExportError::malformed(
                        &path,
                        format!("row {}: no {} with id {}", line + 1, rel.end_label(), end),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Read the identifier and endpoint columns of the file set in `dir`.
///
/// Fails with [`ExportError::MissingManifest`] for a directory without a
/// manifest and with [`ExportError::Malformed`] when a header or a row
/// count disagrees with what the export wrote.
pub fn read_bulk_import(dir: impl AsRef<Path>) -> ExportResult<BulkImport> {
    let dir = dir.as_ref();
    let manifest = ExportManifest::read_from(dir)?;
    let mut keys = BTreeMap::new();
    let mut pairs = BTreeMap::new();

    for file in BulkFile::ALL {
        let path = dir.join(file.file_name());
        let expected_rows = manifest
            .entry(file.file_name())
            .map(|e| e.rows)
            .ok_or_else(|| ExportError::malformed(&path, "not listed in the manifest"))?;

        let mut reader = csv::Reader::from_path(&path).map_err(|e| ExportError::csv(&path, e))?;
        let header = reader
            .headers()
            .map_err(|e| ExportError::csv(&path, e))?
            .clone();
        let expected_header = file.header();
        if !header.iter().eq(expected_header.iter().map(String::as_str)) {
            return Err(ExportError::malformed(
                &path,
                format!("unexpected header {:?}", header),
            ));
        }

        let mut firsts = Vec::with_capacity(expected_rows);
        let mut seconds = Vec::with_capacity(expected_rows);
        for record in reader.records() {
            let record = record.map_err(|e| ExportError::csv(&path, e))?;
            firsts.push(record.get(0).unwrap_or_default().to_string());
            if let BulkFile::Relationships(_) = file {
                seconds.push(record.get(1).unwrap_or_default().to_string());
            }
        }

        if firsts.len() != expected_rows {
            return Err(ExportError::malformed(
                &path,
                format!(
                    "manifest lists {} rows, found {}",
                    expected_rows,
                    firsts.len()
                ),
            ));
        }
        debug!(path = %path.display(), rows = firsts.len(), "Bulk file read");

        match file {
            BulkFile::Nodes(label) => {
                keys.insert(label, firsts);
            }
            BulkFile::Relationships(rel) => {
                pairs.insert(rel, firsts.into_iter().zip(seconds).collect());
            }
        }
    }

    Ok(BulkImport {
        manifest,
        keys,
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_directory_without_manifest_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("instruments.csv"), "isin:ID(Instrument)\n").unwrap();
        let err = read_bulk_import(dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::MissingManifest(_)));
    }

    #[test]
    fn test_check_references_reports_dangling_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ExportManifest {
            schema_version: 1,
            params: synth_core::dataset::GenerationParams::new(
                1,
                Default::default(),
                0,
                chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            ),
            files: Vec::new(),
        };
        let mut import = BulkImport {
            manifest,
            keys: BTreeMap::new(),
            pairs: BTreeMap::new(),
        };
        import
            .keys
            .insert(Label::Instrument, vec!["US0000000000".to_string()]);
        import.pairs.insert(
            RelType::IssuedBy,
            vec![("US0000000000".to_string(), "ISS-000009".to_string())],
        );

        let err = import.check_references(dir.path()).unwrap_err();
        match err {
            ExportError::Malformed { path, message } => {
                assert!(path.ends_with("inst_issued_by_rel.csv"));
                assert!(message.contains("ISS-000009"));
            }
            other => panic!("Expected malformed error, got {:?}", other),
        }
    }
}
