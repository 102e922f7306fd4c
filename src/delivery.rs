//! Telemetry Delivery Channel
//!
//! The transport shipping records to the telemetry backend. The trait is
//! the seam for tests and alternative backends; [`HttpDelivery`] is the
//! default reqwest-backed implementation performing a single
//! request-response exchange per record. Delivery is strictly
//! best-effort: one attempt, no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::record::TelemetryRecord;

/// Errors from a single delivery attempt
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Telemetry endpoint returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Telemetry request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result of a delivery attempt
pub type DeliveryResult = Result<(), DeliveryError>;

/// Transport shipping a telemetry record to a backend
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Perform a single request-response exchange delivering `record` to
    /// `destination`, attaching `credential` as a bearer authorization
    /// value when present.
    async fn send(
        &self,
        destination: &str,
        record: &TelemetryRecord,
        credential: Option<&str>,
    ) -> DeliveryResult;
}

// ============================================================================
// HTTP Delivery
// ============================================================================

/// Default delivery timeout. A hung telemetry send must not pin a
/// detached task forever.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP delivery channel POSTing records as JSON
#[derive(Debug, Clone)]
pub struct HttpDelivery {
    client: Client,
}

impl HttpDelivery {
    /// Create a channel with the default request timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a channel with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for HttpDelivery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for HttpDelivery {
    async fn send(
        &self,
        destination: &str,
        record: &TelemetryRecord,
        credential: Option<&str>,
    ) -> DeliveryResult {
        let mut request = self.client.post(destination).json(record);

        if let Some(token) = credential {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
