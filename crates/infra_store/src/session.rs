//! # Graph Session Port
//!
//! The loader talks to a store only through [`GraphSession`]. The caller
//! constructs the session and passes it in; there is no global driver.
//!
//! - [`crate::memory::InMemoryGraph`]: in-process store for tests
//! - [`crate::http::HttpGraphSession`]: Neo4j HTTP transactional endpoint

use crate::error::StoreError;
use crate::statement::Statement;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Counters reported by the store for committed writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStats {
    /// Nodes created (merges that matched are not counted)
    pub nodes_created: u64,
    /// Relationships created
    pub relationships_created: u64,
    /// Properties set, including overwrites with the same value
    pub properties_set: u64,
}

impl AddAssign for WriteStats {
    fn add_assign(&mut self, other: Self) {
        self.nodes_created += other.nodes_created;
        self.relationships_created += other.relationships_created;
        self.properties_set += other.properties_set;
    }
}

/// A session against a graph store.
///
/// Implementations must be shareable across tasks; the loader keeps several
/// units in flight within one stage.
#[async_trait]
pub trait GraphSession: Send + Sync {
    /// Check that the store is reachable and the credentials are accepted.
    async fn verify_connectivity(&self) -> Result<(), StoreError>;

    /// Run `unit` as one transaction: every statement commits or none does.
    async fn execute(&self, unit: &[Statement]) -> Result<WriteStats, StoreError>;
}
