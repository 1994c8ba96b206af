//! Integration tests for the HTTP session against a mocked transactional endpoint.

use chrono::NaiveDate;
use infra_store::{
    upload, ConnectionConfig, GraphSession, HttpGraphSession, LoadError, LoadOptions, Statement,
    StoreError,
};
use serde_json::json;
use std::sync::Arc;
use synth_core::cancel::CancelFlag;
use synth_core::dataset::{assemble, EntityCounts, GenerationParams};
use synth_core::schema::{Label, RelRecord, RelType};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMMIT_PATH: &str = "/db/neo4j/tx/commit";

fn session(server: &MockServer) -> HttpGraphSession {
    HttpGraphSession::new(&ConnectionConfig::new(server.uri(), "neo4j", "pw", "neo4j")).unwrap()
}

fn ok_body(nodes: u64, relationships: u64, properties: u64) -> serde_json::Value {
    json!({
        "results": [{
            "columns": [],
            "data": [],
            "stats": {
                "contains_updates": true,
                "nodes_created": nodes,
                "relationships_created": relationships,
                "properties_set": properties
            }
        }],
        "errors": []
    })
}

#[tokio::test]
async fn test_execute_posts_statements_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .and(header("authorization", "Basic bmVvNGo6cHc="))
        .and(body_partial_json(json!({
            "statements": [{
                "statement": "UNWIND $batch AS row MATCH (a:Trade {trade_id: row.start}) MATCH (b:Order {order_id: row.end}) MERGE (a)-[r:EXECUTES]->(b)",
                "parameters": {"batch": [{"start": "T-000000000", "end": "O-00000000"}]},
                "includeStats": true
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(0, 1, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let stats = session(&server)
        .execute(&[Statement::MergeRelationships {
            rel: RelType::Executes,
            rows: vec![RelRecord::bare("T-000000000", "O-00000000")],
        }])
        .await
        .unwrap();
    assert_eq!(stats.relationships_created, 1);
}

#[tokio::test]
async fn test_server_errors_map_to_statement_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "errors": [{
                "code": "Neo.ClientError.Schema.ConstraintValidationFailed",
                "message": "Node already exists"
            }]
        })))
        .mount(&server)
        .await;

    let err = session(&server)
        .execute(&[Statement::CreateConstraint { label: Label::Order }])
        .await
        .unwrap_err();
    match err {
        StoreError::Statement { code, .. } => {
            assert_eq!(code, "Neo.ClientError.Schema.ConstraintValidationFailed")
        }
        other => panic!("Expected statement error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = session(&server).verify_connectivity().await.unwrap_err();
    assert!(matches!(err, StoreError::Authentication(_)));
    assert!(err.is_connection());
}

#[tokio::test]
async fn test_refused_connection_is_connection_error() {
    let session =
        HttpGraphSession::new(&ConnectionConfig::new("http://127.0.0.1:1", "neo4j", "pw", "neo4j"))
            .unwrap();
    let err = session.verify_connectivity().await.unwrap_err();
    assert!(matches!(err, StoreError::Connection(_)));
}

#[tokio::test]
async fn test_upload_over_http_sends_one_request_per_unit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(1, 0, 1)))
        .mount(&server)
        .await;

    let counts = EntityCounts {
        instruments: 5,
        issuers: 1,
        counterparties: 2,
        trades: 6,
        signals: 2,
        events: 2,
    };
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let dataset = assemble(&GenerationParams::new(8, counts, 2, as_of)).unwrap();

    let summary = upload(
        &dataset,
        Arc::new(session(&server)),
        LoadOptions {
            batch_size: 2,
            max_concurrent_batches: 2,
        },
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    // One connectivity probe plus one request per unit.
    assert_eq!(requests.len(), summary.total_batches() + 1);
}

#[tokio::test]
async fn test_upload_against_down_store_is_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let counts = EntityCounts {
        instruments: 2,
        issuers: 1,
        ..Default::default()
    };
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let dataset = assemble(&GenerationParams::new(1, counts, 1, as_of)).unwrap();
    let err = upload(
        &dataset,
        Arc::new(session(&server)),
        LoadOptions::default(),
        &CancelFlag::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LoadError::Connection(StoreError::Protocol(_))));
}
