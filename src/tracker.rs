//! Tracking Wrapper
//!
//! Wraps an asynchronous call to capture usage telemetry without
//! altering the call's behavior: the caller sees exactly the same
//! success or failure as the unwrapped call, with delivery happening on
//! a detached task whose outcome only the diagnostic sink observes.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::config::{take_model_override, TrackerConfig};
use crate::delivery::{DeliveryChannel, HttpDelivery};
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::record::TelemetryRecord;

/// Instruments an async call with usage telemetry.
///
/// Closes over one resolved [`TrackerConfig`] for its entire lifetime.
/// Each [`call`](Tracker::call) constructs a fresh [`TelemetryRecord`];
/// no state is shared across invocations.
///
/// Must be used inside a Tokio runtime: record delivery runs on a
/// spawned task that is never joined by the caller path.
pub struct Tracker {
    config: TrackerConfig,
    delivery: Arc<dyn DeliveryChannel>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Tracker {
    /// Create a tracker delivering over HTTP and logging diagnostics via
    /// the `log` facade
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_channels(config, Arc::new(HttpDelivery::new()), Arc::new(LogSink))
    }

    /// Create a tracker with injected delivery and diagnostic channels
    pub fn with_channels(
        config: TrackerConfig,
        delivery: Arc<dyn DeliveryChannel>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            config,
            delivery,
            diagnostics,
        }
    }

    /// The resolved configuration this tracker closes over
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Invoke `target` and emit a telemetry record on success.
    ///
    /// On success the target's result is returned unchanged; token usage
    /// and model name are extracted from its serialized form and the
    /// assembled record is dispatched without being awaited here.
    /// Delivery failure or latency never delays or alters the return
    /// value.
    ///
    /// On failure no record is produced and no delivery is attempted;
    /// the original error is returned unchanged after a diagnostic.
    pub async fn call<F, Fut, T, E>(&self, target: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        let start = Instant::now();

        match target().await {
            Ok(result) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                self.dispatch(&result, duration_ms);
                Ok(result)
            }
            Err(error) => {
                self.diagnostics.error(&format!(
                    "{} failed after {} ms: {}",
                    self.config.function_name,
                    start.elapsed().as_millis(),
                    error
                ));
                Err(error)
            }
        }
    }

    /// Assemble a record for a successful call and hand it to the
    /// delivery channel on a detached task.
    fn dispatch<T: Serialize>(&self, result: &T, duration_ms: u64) {
        let response = match serde_json::to_value(result) {
            Ok(value) => value,
            Err(error) => {
                self.diagnostics.warn(&format!(
                    "response for {} is not serializable ({}); recording zero usage",
                    self.config.function_name, error
                ));
                Value::Null
            }
        };

        let usage = self
            .config
            .token_extractor
            .extract(&response, self.diagnostics.as_ref());

        let mut metadata = self.config.metadata.clone();
        // Caller-supplied metadata is the override channel for providers
        // whose responses cannot identify the model.
        let model_name = take_model_override(&mut metadata).or_else(|| {
            self.config
                .model_extractor
                .extract(&response, self.diagnostics.as_ref())
        });

        let record = TelemetryRecord::new(
            &self.config.function_name,
            usage,
            model_name,
            metadata,
            duration_ms,
        );

        let delivery = Arc::clone(&self.delivery);
        let diagnostics = Arc::clone(&self.diagnostics);
        let destination = self.config.destination.clone();
        let credential = self.config.credential.clone();

        // Fire-and-forget: the handle is dropped, never joined. The only
        // observer of the delivery outcome is the diagnostic sink.
        tokio::spawn(async move {
            if let Err(error) = delivery
                .send(&destination, &record, credential.as_deref())
                .await
            {
                diagnostics.error(&format!(
                    "telemetry delivery to {} failed: {}",
                    destination, error
                ));
            }
        });
    }
}

/// Run `target` under a one-off tracker built from `config`.
pub async fn track<F, Fut, T, E>(config: TrackerConfig, target: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: Serialize,
    E: Display,
{
    Tracker::new(config).call(target).await
}

// ============================================================================
// Tests
// ============================================================================
