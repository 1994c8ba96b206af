//! # adapter_bulk: Bulk-Import File Sets
//!
//! Writes a generated [`Dataset`](synth_core::dataset::Dataset) as the CSV
//! file set consumed by `neo4j-admin database import`, and reads such a set
//! back for checking.
//!
//! ## Completeness
//!
//! An export removes any earlier `manifest.json` before touching data files
//! and writes a new one only after every file has been written. Consumers
//! must treat a directory without a manifest as incomplete;
//! [`read_bulk_import`] refuses one.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use adapter_bulk::{export, read_bulk_import};
//! use chrono::NaiveDate;
//! use synth_core::cancel::CancelFlag;
//! use synth_core::dataset::{assemble, EntityCounts, GenerationParams};
//!
//! let counts = EntityCounts { instruments: 10, issuers: 2, ..Default::default() };
//! let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
//! let dataset = assemble(&GenerationParams::new(1, counts, 3, as_of)).unwrap();
//!
//! let summary = export(&dataset, "neo4j_mock_out_seed_1", &CancelFlag::new()).unwrap();
//! let import = read_bulk_import(&summary.out_dir).unwrap();
//! import.check_references(&summary.out_dir).unwrap();
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod exporter;
pub mod layout;
pub mod manifest;
pub mod reader;

pub use error::{ExportError, ExportResult};
pub use exporter::{export, ExportSummary};
pub use layout::{BulkFile, FileKind, MANIFEST_FILE};
pub use manifest::{ExportManifest, ManifestEntry};
pub use reader::{read_bulk_import, BulkImport};
