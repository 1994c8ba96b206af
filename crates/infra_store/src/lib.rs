//! # infra_store: Graph Store Sessions and Transactional Loader
//!
//! ## Layer 2 (Infra) Role
//!
//! - Session port: [`GraphSession`] (`session`)
//! - Structured write statements and their Cypher rendering (`statement`)
//! - In-memory store with merge semantics (`memory`)
//! - Neo4j HTTP transactional session (`http`)
//! - Batched, staged, idempotent loader (`loader`)
//!
//! ```rust
//! use chrono::NaiveDate;
//! use infra_store::{upload, InMemoryGraph, LoadOptions};
//! use std::sync::Arc;
//! use synth_core::cancel::CancelFlag;
//! use synth_core::dataset::{assemble, EntityCounts, GenerationParams};
//! use synth_core::schema::Label;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let counts = EntityCounts { instruments: 4, issuers: 1, ..Default::default() };
//! let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
//! let dataset = assemble(&GenerationParams::new(3, counts, 2, as_of)).unwrap();
//!
//! let graph = Arc::new(InMemoryGraph::new());
//! upload(&dataset, Arc::clone(&graph), LoadOptions::default(), &CancelFlag::new())
//!     .await
//!     .unwrap();
//! assert_eq!(graph.node_count(Label::Instrument), 4);
//! # });
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod loader;
pub mod memory;
pub mod session;
pub mod statement;

pub use error::{LoadError, StoreError};
pub use http::{ConnectionConfig, HttpGraphSession};
pub use loader::{
    upload, BatchProgress, LoadOptions, LoadStage, Loader, StageSummary, UploadSummary,
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONCURRENT_BATCHES,
};
pub use memory::InMemoryGraph;
pub use session::{GraphSession, WriteStats};
pub use statement::{NodeRow, Statement};
