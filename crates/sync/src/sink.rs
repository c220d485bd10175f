use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::payload::SheetPayload;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No sheet endpoint configured")]
    NotConfigured,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sheet endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub destination: String,
    pub rows_sent: usize,
    /// HTTP status of the push, when one was made.
    pub status: Option<u16>,
}

/// Somewhere a run's results can be published.
pub trait SheetSink: Send + Sync {
    fn push(
        &self,
        payload: &SheetPayload,
    ) -> impl Future<Output = Result<SyncReport, SyncError>> + Send;
}

// ── No-op sink ────────────────────────────────────────────────────────────────

/// Accepts every payload and sends nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl SheetSink for NoopSink {
    async fn push(&self, _payload: &SheetPayload) -> Result<SyncReport, SyncError> {
        Ok(SyncReport {
            destination: "none".to_string(),
            rows_sent: 0,
            status: None,
        })
    }
}

// ── HTTP sink ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// POSTs the payload as JSON, with an optional bearer token.
#[derive(Debug, Clone)]
pub struct HttpSheetSink {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpSheetSink {
    pub fn new(config: SheetConfig) -> Result<Self, SyncError> {
        let endpoint = config
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or(SyncError::NotConfigured)?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            token: config.token.filter(|t| !t.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SheetSink for HttpSheetSink {
    async fn push(&self, payload: &SheetPayload) -> Result<SyncReport, SyncError> {
        let mut request = self.http.post(&self.endpoint).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::info!(endpoint = %self.endpoint, rows = payload.rows.len(), "pushing to sheet");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Ok(SyncReport {
            destination: self.endpoint.clone(),
            rows_sent: payload.rows.len(),
            status: Some(status.as_u16()),
        })
    }
}
