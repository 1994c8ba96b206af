//! # synth_core: Deterministic Synthetic Market Graph
//!
//! ## Layer 1 (Foundation) Role
//!
//! synth_core is the bottom layer of the workspace and knows nothing about
//! storage. It provides:
//! - Entity types: `Instrument`, `Issuer`, `Counterparty`, `Order`, `Trade`,
//!   `Signal`, `Event`, `CorrelationEdge` (`types`)
//! - The graph schema contract shared by every writer (`schema`)
//! - Seeded per-entity random streams (`rng`)
//! - Entity generators and the referential linker (`generators`, `linker`)
//! - Validated parameters and dataset assembly (`dataset`)
//! - Error types: `SynthError` (`error`)
//!
//! ## Determinism
//!
//! Identical parameters (including the seed and the as-of date) produce a
//! byte-identical dataset. Each generator draws from its own sub-seed, so
//! changing one count does not perturb any other collection.
//!
//! ## Usage Examples
//!
//! ```rust
//! use chrono::NaiveDate;
//! use synth_core::dataset::{assemble, EntityCounts, GenerationParams};
//!
//! let counts = EntityCounts {
//!     instruments: 10,
//!     issuers: 2,
//!     counterparties: 3,
//!     trades: 20,
//!     signals: 5,
//!     events: 5,
//! };
//! let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
//! let dataset = assemble(&GenerationParams::new(1, counts, 3, as_of)).unwrap();
//!
//! assert_eq!(dataset.orders().len(), 13);
//! assert_eq!(dataset.correlation_edges().len(), 30);
//! assert!(dataset.verify_references().is_ok());
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod cancel;
pub mod dataset;
pub mod error;
pub mod generators;
pub mod linker;
pub mod rng;
pub mod schema;
pub mod types;

/// Commonly used items.
pub mod prelude {
    pub use crate::cancel::CancelFlag;
    pub use crate::dataset::{assemble, Dataset, EntityCounts, GenerationParams, GenerationRequest};
    pub use crate::error::{SynthError, SynthResult};
    pub use crate::schema::{GraphNode, Label, PropertyValue, RelRecord, RelType, SCHEMA_VERSION};
    pub use crate::types::*;
}
