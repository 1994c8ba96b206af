//! In-process graph store with merge semantics.
//!
//! Behaves like the real store for everything the loader relies on:
//! constraints are idempotent, node merges match by key, relationship merges
//! silently create nothing when an endpoint is missing, and a unit is
//! all-or-nothing. Failures can be injected to exercise error paths.

use crate::error::StoreError;
use crate::session::{GraphSession, WriteStats};
use crate::statement::Statement;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use synth_core::schema::{Label, PropertyValue, RelType};

type Properties = BTreeMap<String, PropertyValue>;

#[derive(Debug, Default)]
struct GraphState {
    constraints: BTreeSet<Label>,
    nodes: HashMap<(Label, String), Properties>,
    relationships: HashMap<(RelType, String, String), Properties>,
    history: Vec<&'static str>,
}

const NO_FAILURE: usize = usize::MAX;

/// In-memory [`GraphSession`].
#[derive(Debug)]
pub struct InMemoryGraph {
    state: Mutex<GraphState>,
    fail_on_unit: AtomicUsize,
    unreachable: bool,
    units_started: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self {
            state: Mutex::default(),
            fail_on_unit: AtomicUsize::new(NO_FAILURE),
            unreachable: false,
            units_started: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }
}

impl InMemoryGraph {
    /// Empty, reachable store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th unit executed (zero-based) without applying it.
    pub fn fail_on_unit(self, n: usize) -> Self {
        self.fail_on_unit.store(n, Ordering::SeqCst);
        self
    }

    /// Fail the connectivity check and every unit with a connection error.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Stop injecting unit failures, e.g. before a resumed run.
    pub fn clear_failures(&self) {
        self.fail_on_unit.store(NO_FAILURE, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Nodes carrying `label`
    pub fn node_count(&self, label: Label) -> usize {
        self.lock().nodes.keys().filter(|(l, _)| *l == label).count()
    }

    /// Relationships of type `rel`
    pub fn relationship_count(&self, rel: RelType) -> usize {
        self.lock()
            .relationships
            .keys()
            .filter(|(r, _, _)| *r == rel)
            .count()
    }

    /// Total nodes
    pub fn total_nodes(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Total relationships
    pub fn total_relationships(&self) -> usize {
        self.lock().relationships.len()
    }

    /// Labels with a uniqueness constraint
    pub fn constraints(&self) -> BTreeSet<Label> {
        self.lock().constraints.clone()
    }

    /// Properties of one node, key excluded
    pub fn node_properties(&self, label: Label, key: &str) -> Option<BTreeMap<String, PropertyValue>> {
        self.lock().nodes.get(&(label, key.to_string())).cloned()
    }

    /// Properties of one relationship
    pub fn relationship_properties(
        &self,
        rel: RelType,
        start: &str,
        end: &str,
    ) -> Option<BTreeMap<String, PropertyValue>> {
        self.lock()
            .relationships
            .get(&(rel, start.to_string(), end.to_string()))
            .cloned()
    }

    /// Endpoint pairs of every relationship of type `rel`, sorted
    pub fn relationship_pairs(&self, rel: RelType) -> BTreeSet<(String, String)> {
        self.lock()
            .relationships
            .keys()
            .filter(|(r, _, _)| *r == rel)
            .map(|(_, s, e)| (s.clone(), e.clone()))
            .collect()
    }

    /// Target (label, type or `constraints`) of each committed unit, in commit order
    pub fn history(&self) -> Vec<&'static str> {
        self.lock().history.clone()
    }

    /// Highest number of units observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

fn unit_target(unit: &[Statement]) -> &'static str {
    match unit.first() {
        Some(Statement::CreateConstraint { .. }) => "constraints",
        Some(Statement::MergeNodes { label, .. }) => label.name(),
        Some(Statement::MergeRelationships { rel, .. }) => rel.name(),
        None => "empty",
    }
}

impl GraphState {
    fn apply(&mut self, statement: &Statement) -> WriteStats {
        let mut stats = WriteStats::default();
        match statement {
            Statement::CreateConstraint { label } => {
                self.constraints.insert(*label);
            }
            Statement::MergeNodes { label, columns, rows } => {
                for row in rows {
                    let properties = self
                        .nodes
                        .entry((*label, row.key.clone()))
                        .or_insert_with(|| {
                            stats.nodes_created += 1;
                            stats.properties_set += 1;
                            Properties::new()
                        });
                    for (column, value) in columns.iter().zip(&row.values) {
                        properties.insert(column.name.to_string(), value.clone());
                        stats.properties_set += 1;
                    }
                }
            }
            Statement::MergeRelationships { rel, rows } => {
                for row in rows {
                    let start_exists = self
                        .nodes
                        .contains_key(&(rel.start_label(), row.start.clone()));
                    let end_exists = self.nodes.contains_key(&(rel.end_label(), row.end.clone()));
                    if !(start_exists && end_exists) {
                        continue;
                    }
                    let properties = self
                        .relationships
                        .entry((*rel, row.start.clone(), row.end.clone()))
                        .or_insert_with(|| {
                            stats.relationships_created += 1;
                            Properties::new()
                        });
                    for (column, value) in rel.properties().iter().zip(&row.properties) {
                        properties.insert(column.name.to_string(), value.clone());
                        stats.properties_set += 1;
                    }
                    if *rel == RelType::CorrelatedWith {
                        properties.insert(
                            "last_updated".to_string(),
                            PropertyValue::DateTime(Utc::now()),
                        );
                        stats.properties_set += 1;
                    }
                }
            }
        }
        stats
    }
}

#[async_trait]
impl GraphSession for InMemoryGraph {
    async fn verify_connectivity(&self) -> Result<(), StoreError> {
        if self.unreachable {
            return Err(StoreError::Connection("in-memory store marked unreachable".to_string()));
        }
        Ok(())
    }

    async fn execute(&self, unit: &[Statement]) -> Result<WriteStats, StoreError> {
        if self.unreachable {
            return Err(StoreError::Connection("in-memory store marked unreachable".to_string()));
        }
        let index = self.units_started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        // Let other in-flight units interleave before this one commits.
        tokio::task::yield_now().await;

        let result = if self.fail_on_unit.load(Ordering::SeqCst) == index {
            Err(StoreError::Injected(index))
        } else {
            let mut state = self.lock();
            let mut stats = WriteStats::default();
            for statement in unit {
                stats += state.apply(statement);
            }
            state.history.push(unit_target(unit));
            Ok(stats)
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::NodeRow;
    use synth_core::schema::{Column, PropertyType, RelRecord};

    const NAME: &[Column] = &[Column::new("name", PropertyType::String)];

    fn issuer(key: &str, name: &str) -> NodeRow {
        NodeRow {
            key: key.to_string(),
            values: vec![PropertyValue::Str(name.to_string())],
        }
    }

    fn merge_issuers(rows: Vec<NodeRow>) -> Statement {
        Statement::MergeNodes {
            label: Label::Issuer,
            columns: NAME,
            rows,
        }
    }

    #[tokio::test]
    async fn test_node_merge_is_idempotent_and_updates() {
        let graph = InMemoryGraph::new();
        let first = graph
            .execute(&[merge_issuers(vec![issuer("ISS-000000", "Hale Group")])])
            .await
            .unwrap();
        assert_eq!(first.nodes_created, 1);

        let second = graph
            .execute(&[merge_issuers(vec![issuer("ISS-000000", "Quinn PLC")])])
            .await
            .unwrap();
        assert_eq!(second.nodes_created, 0);
        assert_eq!(graph.node_count(Label::Issuer), 1);
        assert_eq!(
            graph.node_properties(Label::Issuer, "ISS-000000").unwrap()["name"],
            PropertyValue::Str("Quinn PLC".to_string())
        );
    }

    #[tokio::test]
    async fn test_relationship_with_missing_endpoint_creates_nothing() {
        let graph = InMemoryGraph::new();
        let stats = graph
            .execute(&[Statement::MergeRelationships {
                rel: RelType::IssuedBy,
                rows: vec![RelRecord::bare("US0000000010", "ISS-000000")],
            }])
            .await
            .unwrap();
        assert_eq!(stats.relationships_created, 0);
        assert_eq!(graph.total_relationships(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure_applies_nothing() {
        let graph = InMemoryGraph::new().fail_on_unit(1);
        graph
            .execute(&[merge_issuers(vec![issuer("ISS-000000", "A")])])
            .await
            .unwrap();
        let err = graph
            .execute(&[merge_issuers(vec![issuer("ISS-000001", "B")])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Injected(1)));
        assert_eq!(graph.node_count(Label::Issuer), 1);
        assert_eq!(graph.history(), vec!["Issuer"]);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let graph = InMemoryGraph::new().unreachable();
        assert!(graph.verify_connectivity().await.unwrap_err().is_connection());
    }

    #[tokio::test]
    async fn test_constraints_are_idempotent() {
        let graph = InMemoryGraph::new();
        let unit = [Statement::CreateConstraint { label: Label::Trade }];
        graph.execute(&unit).await.unwrap();
        graph.execute(&unit).await.unwrap();
        assert_eq!(graph.constraints().len(), 1);
    }
}
