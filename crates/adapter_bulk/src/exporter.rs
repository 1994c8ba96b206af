//! Bulk-import CSV export.
//!
//! Order of operations for one export:
//! 1. create the output directory and remove any previous manifest,
//! 2. write every data file (in parallel, each file truncated first),
//! 3. write the manifest via a temporary file and a rename.
//!
//! A crash or error in step 2 leaves data files but no manifest, which
//! readers treat as an incomplete set.

use crate::error::{ExportError, ExportResult};
use crate::layout::BulkFile;
use crate::manifest::{ExportManifest, ManifestEntry};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use synth_core::cancel::CancelFlag;
use synth_core::dataset::Dataset;
use synth_core::schema::{GraphNode, Label, RelRecord, SCHEMA_VERSION};
use tracing::{debug, info};

/// Result of a completed export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Output directory
    pub out_dir: PathBuf,
    /// Path of the manifest
    pub manifest_path: PathBuf,
    /// Manifest contents
    pub manifest: ExportManifest,
}

impl ExportSummary {
    /// Paths of all data files, nodes first.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.manifest.paths(&self.out_dir)
    }
}

/// Export `dataset` as a bulk-import file set under `out_dir`.
///
/// Existing files of the same name are overwritten. `cancel` is checked
/// before each file; a cancelled export leaves no manifest.
pub fn export(
    dataset: &Dataset,
    out_dir: impl AsRef<Path>,
    cancel: &CancelFlag,
) -> ExportResult<ExportSummary> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).map_err(|e| ExportError::io(out_dir, e))?;
    ExportManifest::remove_from(out_dir)?;

    let files: Vec<ManifestEntry> = BulkFile::ALL
        .par_iter()
        .map(|&file| {
            if cancel.is_cancelled() {
                return Err(ExportError::Cancelled {
                    file: file.file_name(),
                });
            }
            let path = out_dir.join(file.file_name());
            let rows = write_file(dataset, file, &path)?;
            debug!(path = %path.display(), rows, "Bulk file written");
            Ok(ManifestEntry {
                file: file.file_name().to_string(),
                kind: file.kind(),
                target: file.target().to_string(),
                rows,
            })
        })
        .collect::<ExportResult<_>>()?;

    if cancel.is_cancelled() {
        return Err(ExportError::Cancelled {
            file: crate::layout::MANIFEST_FILE,
        });
    }

    let manifest = ExportManifest {
        schema_version: SCHEMA_VERSION,
        params: dataset.params().clone(),
        files,
    };
    let manifest_path = manifest.write_to(out_dir)?;

    info!(
        path = %out_dir.display(),
        files = manifest.files.len(),
        rows = manifest.total_rows(),
        "Bulk-import file set written"
    );

    Ok(ExportSummary {
        out_dir: out_dir.to_path_buf(),
        manifest_path,
        manifest,
    })
}

fn write_file(dataset: &Dataset, file: BulkFile, path: &Path) -> ExportResult<usize> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ExportError::csv(path, e))?;
    writer
        .write_record(file.header())
        .map_err(|e| ExportError::csv(path, e))?;

    let rows = match file {
        BulkFile::Nodes(label) => match label {
            Label::Instrument => write_nodes(&mut writer, dataset.instruments(), path)?,
            Label::Issuer => write_nodes(&mut writer, dataset.issuers(), path)?,
            Label::Counterparty => write_nodes(&mut writer, dataset.counterparties(), path)?,
            Label::Order => write_nodes(&mut writer, dataset.orders(), path)?,
            Label::Trade => write_nodes(&mut writer, dataset.trades(), path)?,
            Label::Signal => write_nodes(&mut writer, dataset.signals(), path)?,
            Label::Event => write_nodes(&mut writer, dataset.events(), path)?,
        },
        BulkFile::Relationships(rel) => {
            let records = dataset.relationships(rel);
            for record in &records {
                writer
                    .write_record(relationship_row(record, rel.name()))
                    .map_err(|e| ExportError::csv(path, e))?;
            }
            records.len()
        }
    };

    writer.flush().map_err(|e| ExportError::io(path, e))?;
    Ok(rows)
}

fn write_nodes<N: GraphNode, W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    nodes: &[N],
    path: &Path,
) -> ExportResult<usize> {
    for node in nodes {
        let mut row = Vec::with_capacity(N::COLUMNS.len() + 1);
        row.push(node.key().to_string());
        row.extend(node.values().iter().map(ToString::to_string));
        writer
            .write_record(&row)
            .map_err(|e| ExportError::csv(path, e))?;
    }
    Ok(nodes.len())
}

fn relationship_row(record: &RelRecord, rel_name: &str) -> Vec<String> {
    let mut row = vec![record.start.clone(), record.end.clone(), rel_name.to_string()];
    row.extend(record.properties.iter().map(ToString::to_string));
    row
}
