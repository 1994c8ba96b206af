//! Session over the Neo4j HTTP transactional endpoint.
//!
//! Each unit is posted to `{uri}/db/{database}/tx/commit`, which runs every
//! statement in one transaction and commits it, or rolls it back and
//! reports `errors[]`.

use crate::error::StoreError;
use crate::session::{GraphSession, WriteStats};
use crate::statement::Statement;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Connection settings for [`HttpGraphSession`].
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Base URI, e.g. `http://localhost:7474`
    pub uri: String,
    /// User name
    pub user: String,
    /// Password
    pub password: String,
    /// Database name
    pub database: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ConnectionConfig {
    /// Settings with a 60 second request timeout
    pub fn new(
        uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: Vec<StatementPayload<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatementPayload<'a> {
    statement: String,
    parameters: &'a Value,
    include_stats: bool,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    stats: Option<ResultStats>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultStats {
    #[serde(default)]
    nodes_created: u64,
    #[serde(default)]
    relationships_created: u64,
    #[serde(default)]
    properties_set: u64,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

/// [`GraphSession`] over HTTP.
pub struct HttpGraphSession {
    commit_url: String,
    user: String,
    password: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpGraphSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGraphSession")
            .field("commit_url", &self.commit_url)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl HttpGraphSession {
    /// Create a session. No request is made until first use.
    pub fn new(config: &ConnectionConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            commit_url: format!(
                "{}/db/{}/tx/commit",
                config.uri.trim_end_matches('/'),
                config.database
            ),
            user: config.user.clone(),
            password: config.password.clone(),
            client,
        })
    }

    /// Endpoint every unit is posted to
    pub fn commit_url(&self) -> &str {
        &self.commit_url
    }

    async fn commit(&self, statements: &[Statement]) -> Result<CommitResponse, StoreError> {
        let parameters: Vec<Value> = statements.iter().map(Statement::parameters).collect();
        let request = CommitRequest {
            statements: statements
                .iter()
                .zip(&parameters)
                .map(|(statement, parameters)| StatementPayload {
                    statement: statement.cypher(),
                    parameters,
                    include_stats: true,
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(StoreError::Authentication(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(StoreError::Protocol(format!("HTTP {}", status)));
        }

        let body: CommitResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Protocol(e.to_string()))?;

        if let Some(error) = body.errors.first() {
            if error.code.starts_with("Neo.ClientError.Security") {
                return Err(StoreError::Authentication(error.message.clone()));
            }
            return Err(StoreError::statement(error.code.clone(), error.message.clone()));
        }
        Ok(body)
    }
}

#[async_trait]
impl GraphSession for HttpGraphSession {
    async fn verify_connectivity(&self) -> Result<(), StoreError> {
        self.commit(&[]).await?;
        debug!(url = %self.commit_url, "Store reachable");
        Ok(())
    }

    async fn execute(&self, unit: &[Statement]) -> Result<WriteStats, StoreError> {
        let body = self.commit(unit).await?;
        let mut stats = WriteStats::default();
        for result in body.results {
            let s = result.stats.unwrap_or_default();
            stats += WriteStats {
                nodes_created: s.nodes_created,
                relationships_created: s.relationships_created,
                properties_set: s.properties_set,
            };
        }
        Ok(stats)
    }
}
