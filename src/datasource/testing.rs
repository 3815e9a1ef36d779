//! In-memory backend for tests

use crate::datasource::client::{PingResponse, SqlBackend};
use crate::datasource::error::{DatasourceError, DatasourceResult};
use crate::frame::Row;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

enum Reply {
    Rows(Vec<Row>),
    Fail {
        status: u16,
        code: String,
        message: String,
    },
}

/// Answers SQL by the first rule whose needle appears in the statement
pub(crate) struct FakeBackend {
    rules: Vec<(String, Reply)>,
    ping: PingResponse,
    executed: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            rules: Vec::new(),
            ping: PingResponse {
                status: 200,
                body: String::new(),
            },
            executed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_rows(mut self, needle: &str, rows: Value) -> Self {
        let rows = serde_json::from_value(rows).expect("rows must be an array of objects");
        self.rules.push((needle.to_string(), Reply::Rows(rows)));
        self
    }

    pub(crate) fn with_failure(mut self, needle: &str, status: u16, code: &str, message: &str) -> Self {
        self.rules.push((
            needle.to_string(),
            Reply::Fail {
                status,
                code: code.to_string(),
                message: message.to_string(),
            },
        ));
        self
    }

    pub(crate) fn with_ping(mut self, status: u16, body: &str) -> Self {
        self.ping = PingResponse {
            status,
            body: body.to_string(),
        };
        self
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlBackend for FakeBackend {
    async fn execute_sql(&self, sql: &str) -> DatasourceResult<Vec<Row>> {
        self.executed.lock().unwrap().push(sql.to_string());

        match self.rules.iter().find(|(needle, _)| sql.contains(needle.as_str())) {
            Some((_, Reply::Rows(rows))) => Ok(rows.clone()),
            Some((_, Reply::Fail { status, code, message })) => Err(DatasourceError::Backend {
                status: *status,
                code: code.clone(),
                message: message.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn ping(&self) -> DatasourceResult<PingResponse> {
        Ok(self.ping.clone())
    }
}
