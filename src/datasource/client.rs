//! CnosDB HTTP Client
//!
//! The transport the datasource executes SQL through. [`SqlBackend`] is the
//! seam; [`CnosClient`] implements it over CnosDB's REST API:
//!
//! - `POST {url}/api/v1/sql?db={database}` with the statement as body
//! - `GET {url}/api/v1/ping`

use crate::config::DatasourceConfig;
use crate::datasource::error::{DatasourceError, DatasourceResult};
use crate::frame::Row;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

/// Raw outcome of a backend ping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl PingResponse {
    /// Whether the ping returned a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can execute SQL and answer pings
#[async_trait]
pub trait SqlBackend: Send + Sync {
    /// Execute a statement and return its rows
    async fn execute_sql(&self, sql: &str) -> DatasourceResult<Vec<Row>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> DatasourceResult<PingResponse>;
}

/// CnosDB REST API client
pub struct CnosClient {
    client: Client,
    config: DatasourceConfig,
}

impl CnosClient {
    /// Create a client for the configured server
    pub fn new(config: DatasourceConfig) -> DatasourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        tracing::info!(
            url = %config.url,
            database = %config.database,
            "Building datasource"
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &DatasourceConfig {
        &self.config
    }

    fn sql_url(&self) -> String {
        format!(
            "{}/api/v1/sql?db={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.database)
        )
    }

    fn ping_url(&self) -> String {
        format!("{}/api/v1/ping", self.config.url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    error_message: String,
}

/// Decode a successful SQL response body; an empty body means no rows
pub(crate) fn decode_rows(body: &str) -> DatasourceResult<Vec<Row>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(body)?)
}

/// Turn a non-2xx SQL response into an error
pub(crate) fn decode_error(status: u16, body: &str) -> DatasourceError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => DatasourceError::Backend {
            status,
            code: err.error_code,
            message: err.error_message,
        },
        Err(e) => DatasourceError::Decode(format!(
            "CnosDB returned error status: {}. Failed to parse response: {}",
            status, e
        )),
    }
}

#[async_trait]
impl SqlBackend for CnosClient {
    async fn execute_sql(&self, sql: &str) -> DatasourceResult<Vec<Row>> {
        let mut request = self
            .client
            .post(self.sql_url())
            .header(header::ACCEPT, "application/json")
            .body(sql.to_string());

        if let Some(auth) = &self.config.auth {
            request = request.header(header::AUTHORIZATION, format!("Basic {}", auth));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = decode_error(status.as_u16(), &body);
            tracing::error!(status = status.as_u16(), error = %err, "CnosDB query failed");
            return Err(err);
        }

        tracing::debug!(bytes = body.len(), "CnosDB query response");
        decode_rows(&body)
    }

    async fn ping(&self) -> DatasourceResult<PingResponse> {
        let response = self.client.get(self.ping_url()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(PingResponse { status, body })
    }
}
