//! Integration tests for the transactional loader against the in-memory store.

use chrono::NaiveDate;
use infra_store::{upload, InMemoryGraph, LoadError, LoadOptions, LoadStage, Loader};
use proptest::prelude::*;
use std::sync::Arc;
use synth_core::cancel::CancelFlag;
use synth_core::dataset::{assemble, Dataset, EntityCounts, GenerationParams};
use synth_core::schema::{Label, RelType};

fn small_dataset(seed: u64) -> Dataset {
    let counts = EntityCounts {
        instruments: 10,
        issuers: 2,
        counterparties: 3,
        trades: 20,
        signals: 5,
        events: 5,
    };
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    assemble(&GenerationParams::new(seed, counts, 3, as_of)).unwrap()
}

fn options(batch_size: usize, max_concurrent_batches: usize) -> LoadOptions {
    LoadOptions {
        batch_size,
        max_concurrent_batches,
    }
}

fn assert_graph_matches(graph: &InMemoryGraph, dataset: &Dataset) {
    for label in Label::ALL {
        assert_eq!(graph.node_count(label), dataset.node_count(label), "{label}");
    }
    for rel in RelType::ALL {
        let expected: std::collections::BTreeSet<(String, String)> = dataset
            .relationships(rel)
            .into_iter()
            .map(|r| (r.start, r.end))
            .collect();
        assert_eq!(graph.relationship_pairs(rel), expected, "{rel}");
    }
}

#[tokio::test]
async fn test_full_load_matches_dataset() {
    let dataset = small_dataset(1);
    let graph = Arc::new(InMemoryGraph::new());
    let summary = upload(&dataset, Arc::clone(&graph), options(4, 2), &CancelFlag::new())
        .await
        .unwrap();

    assert_graph_matches(&graph, &dataset);
    assert_eq!(graph.constraints().len(), 7);
    assert_eq!(graph.relationship_count(RelType::CorrelatedWith), 30);

    let trades = summary.stage(LoadStage::Trades).unwrap();
    assert_eq!(trades.rows, 20);
    assert_eq!(trades.batches, 5);
    assert_eq!(trades.stats.nodes_created, 20);
    assert_eq!(trades.stats.relationships_created, 40);
    assert_eq!(summary.stages.len(), LoadStage::ALL.len());
    assert_eq!(summary.totals().nodes_created as usize, graph.total_nodes());
}

#[tokio::test]
async fn test_second_load_creates_nothing() {
    let dataset = small_dataset(2);
    let graph = Arc::new(InMemoryGraph::new());
    upload(&dataset, Arc::clone(&graph), options(7, 3), &CancelFlag::new())
        .await
        .unwrap();
    let nodes = graph.total_nodes();
    let relationships = graph.total_relationships();

    let again = upload(&dataset, Arc::clone(&graph), options(7, 3), &CancelFlag::new())
        .await
        .unwrap();
    assert_eq!(graph.total_nodes(), nodes);
    assert_eq!(graph.total_relationships(), relationships);
    assert_eq!(again.totals().nodes_created, 0);
    assert_eq!(again.totals().relationships_created, 0);
}

#[tokio::test]
async fn test_failed_batch_reports_stage_and_index_then_resumes() {
    let dataset = small_dataset(3);
    // Unit 0 is the constraints unit; units 1..=3 are the instrument batches.
    let graph = Arc::new(InMemoryGraph::new().fail_on_unit(3));
    let err = upload(&dataset, Arc::clone(&graph), options(4, 1), &CancelFlag::new())
        .await
        .unwrap_err();

    match err {
        LoadError::Batch {
            stage, batch_index, ..
        } => {
            assert_eq!(stage, "instruments");
            assert_eq!(batch_index, 2);
        }
        other => panic!("Expected batch error, got {:?}", other),
    }
    assert_eq!(graph.node_count(Label::Instrument), 8);
    assert_eq!(graph.node_count(Label::Issuer), 0);

    graph.clear_failures();
    upload(&dataset, Arc::clone(&graph), options(4, 1), &CancelFlag::new())
        .await
        .unwrap();
    assert_graph_matches(&graph, &dataset);
}

#[tokio::test]
async fn test_unreachable_store_writes_nothing() {
    let graph = Arc::new(InMemoryGraph::new().unreachable());
    let err = upload(&small_dataset(1), Arc::clone(&graph), LoadOptions::default(), &CancelFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Connection(_)));
    assert!(graph.history().is_empty());
}

#[tokio::test]
async fn test_cancel_before_start() {
    let graph = Arc::new(InMemoryGraph::new());
    let cancel = CancelFlag::new();
    cancel.cancel();
    let err = upload(&small_dataset(1), Arc::clone(&graph), LoadOptions::default(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Cancelled { stage: "constraints" }));
    assert_eq!(graph.total_nodes(), 0);
}

#[tokio::test]
async fn test_cancel_between_batches() {
    let dataset = small_dataset(4);
    let graph = Arc::new(InMemoryGraph::new());
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let loader = Loader::new(Arc::clone(&graph), options(2, 1))
        .unwrap()
        .with_progress(Arc::new(move |stage, _done, _total| {
            if stage == LoadStage::Orders {
                trigger.cancel();
            }
        }));

    let err = loader.upload(&dataset, &cancel).await.unwrap_err();
    assert!(matches!(err, LoadError::Cancelled { stage: "orders" }));
    assert!(graph.node_count(Label::Order) < dataset.orders().len());
    assert_eq!(graph.node_count(Label::Trade), 0);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let dataset = small_dataset(5);
    let graph = Arc::new(InMemoryGraph::new());
    upload(&dataset, Arc::clone(&graph), options(1, 3), &CancelFlag::new())
        .await
        .unwrap();
    assert!(graph.peak_in_flight() <= 3);
    assert_graph_matches(&graph, &dataset);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_load_on_multi_thread_runtime() {
    let dataset = small_dataset(6);
    let graph = Arc::new(InMemoryGraph::new());
    upload(&dataset, Arc::clone(&graph), options(3, 4), &CancelFlag::new())
        .await
        .unwrap();
    assert!(graph.peak_in_flight() <= 4);
    assert_graph_matches(&graph, &dataset);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Batch size and concurrency never change the resulting graph.
    #[test]
    fn prop_end_state_independent_of_batching(
        seed in any::<u64>(),
        batch_size in 1..25usize,
        concurrency in 1..6usize,
    ) {
        let dataset = small_dataset(seed);
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let graph = Arc::new(InMemoryGraph::new());
        runtime
            .block_on(upload(&dataset, Arc::clone(&graph), options(batch_size, concurrency), &CancelFlag::new()))
            .unwrap();
        for label in Label::ALL {
            prop_assert_eq!(graph.node_count(label), dataset.node_count(label));
        }
        prop_assert!(graph.peak_in_flight() <= concurrency);
    }
}
