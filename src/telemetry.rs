use crate::errors::{FeedError, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Event type reported when defective feature vectors are detected.
pub const VECTOR_ERRORS_EVENT: &str = "ResnetFeatureVectorErrors";

/// A fire-and-forget count event.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEvent {
    #[serde(rename = "eventType")]
    pub event_type: String,
    pub amount: u64,
}

impl FeedEvent {
    pub fn vector_errors(amount: u64) -> Self {
        Self {
            event_type: VECTOR_ERRORS_EVENT.to_string(),
            amount,
        }
    }
}

/// Sink for count events. Emission failures are reported to the caller, who
/// decides whether the failure is fatal (it never is in this pipeline).
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn emit(&self, event: FeedEvent) -> Result<()>;
}

/// Sink used for tests and for deployments without a telemetry endpoint.
pub struct NullTelemetrySink;

#[async_trait]
impl TelemetrySink for NullTelemetrySink {
    async fn emit(&self, _event: FeedEvent) -> Result<()> {
        Ok(())
    }
}

/// HTTP sink posting events as a one-element JSON array, the wire shape the
/// downstream event API expects.
pub struct HttpTelemetrySink {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpTelemetrySink {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn emit(&self, event: FeedEvent) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(&[event]);
        if let Some(key) = &self.api_key {
            request = request.header("Api-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| FeedError::Telemetry(format!("event post failed: {err}")))?;

        if !response.status().is_success() {
            return Err(FeedError::Telemetry(format!(
                "telemetry endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
