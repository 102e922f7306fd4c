//! Tracker Factory
//!
//! Builds configured trackers from layered configuration. Precedence for
//! metadata, lowest to highest: base < call-specific < runtime (supplied
//! at invocation time). Scalar fields resolve with the call layer
//! overriding the base entirely.
//!
//! Runtime metadata varies call-to-call, so a [`ConfiguredTracker`]
//! re-resolves a fresh [`TrackerConfig`] and a fresh [`Tracker`] per
//! invocation: a thin re-resolving shim around the
//! resolved-before-first-call invariant, not an exception to it.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::{merge_metadata, TrackerConfig};
use crate::delivery::{DeliveryChannel, HttpDelivery};
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::extract::{ModelExtractor, Provider, TokenExtractor};
use crate::record::Metadata;
use crate::tracker::Tracker;

// ============================================================================
// Configuration Layers
// ============================================================================

/// Base configuration shared by every tracker a factory produces
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// Default telemetry endpoint
    pub destination: String,
    /// Default bearer credential
    pub credential: Option<String>,
    /// Lowest-precedence metadata layer
    pub metadata: Metadata,
    /// Default token extraction strategy, if any
    pub token_extractor: Option<TokenExtractor>,
    /// Default model extraction strategy, if any
    pub model_extractor: Option<ModelExtractor>,
}

impl BaseConfig {
    /// Create a base configuration for `destination`
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            credential: None,
            metadata: Metadata::new(),
            token_extractor: None,
            model_extractor: None,
        }
    }

    /// Attach a bearer credential for delivery
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Replace the base metadata layer
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Insert a single base metadata entry
    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Default both extraction strategies to those of `provider`
    pub fn for_provider(mut self, provider: Provider) -> Self {
        self.token_extractor = Some(provider.token_extractor());
        self.model_extractor = Some(provider.model_extractor());
        self
    }
}

/// Call-specific configuration for one wrapped function
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Identifier for the wrapped function (required)
    pub function_name: String,
    /// Endpoint override, replacing the base destination entirely
    pub destination: Option<String>,
    /// Credential override, replacing the base credential entirely
    pub credential: Option<String>,
    /// Middle-precedence metadata layer
    pub metadata: Metadata,
    /// Token extraction override
    pub token_extractor: Option<TokenExtractor>,
    /// Model extraction override
    pub model_extractor: Option<ModelExtractor>,
}

impl CallConfig {
    /// Create a call configuration for `function_name`
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            destination: None,
            credential: None,
            metadata: Metadata::new(),
            token_extractor: None,
            model_extractor: None,
        }
    }

    /// Override the delivery destination for this function
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Override the bearer credential for this function
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Replace the call-specific metadata layer
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Insert a single call-specific metadata entry
    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Override both extraction strategies with those of `provider`
    pub fn for_provider(mut self, provider: Provider) -> Self {
        self.token_extractor = Some(provider.token_extractor());
        self.model_extractor = Some(provider.model_extractor());
        self
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Produces configured trackers sharing one base configuration and one
/// pair of delivery/diagnostic channels
pub struct TrackerFactory {
    base: BaseConfig,
    delivery: Arc<dyn DeliveryChannel>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl TrackerFactory {
    /// Create a factory delivering over HTTP and logging diagnostics via
    /// the `log` facade
    pub fn new(base: BaseConfig) -> Self {
        Self::with_channels(base, Arc::new(HttpDelivery::new()), Arc::new(LogSink))
    }

    /// Create a factory with injected delivery and diagnostic channels
    pub fn with_channels(
        base: BaseConfig,
        delivery: Arc<dyn DeliveryChannel>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            base,
            delivery,
            diagnostics,
        }
    }

    /// Build a configured tracker for one wrapped function
    pub fn tracker(&self, call: CallConfig) -> ConfiguredTracker {
        ConfiguredTracker {
            base: self.base.clone(),
            call,
            delivery: Arc::clone(&self.delivery),
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }
}

// ============================================================================
// Configured Tracker
// ============================================================================

/// A factory-produced tracker resolving its configuration at invocation
/// time so runtime metadata can participate in the merge
pub struct ConfiguredTracker {
    base: BaseConfig,
    call: CallConfig,
    delivery: Arc<dyn DeliveryChannel>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ConfiguredTracker {
    /// Invoke `target` with base and call-specific configuration merged
    pub async fn call<F, Fut, T, E>(&self, target: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        self.tracker_for(None).call(target).await
    }

    /// Invoke `target` with `runtime` metadata merged at highest
    /// precedence, resolving a fresh configuration for this call only
    pub async fn call_with_metadata<F, Fut, T, E>(
        &self,
        runtime: Metadata,
        target: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        self.tracker_for(Some(&runtime)).call(target).await
    }

    /// Resolve the full configuration for one invocation
    fn resolve(&self, runtime: Option<&Metadata>) -> TrackerConfig {
        let metadata = match runtime {
            Some(runtime) => merge_metadata(&[&self.base.metadata, &self.call.metadata, runtime]),
            None => merge_metadata(&[&self.base.metadata, &self.call.metadata]),
        };

        TrackerConfig {
            function_name: self.call.function_name.clone(),
            destination: self
                .call
                .destination
                .clone()
                .unwrap_or_else(|| self.base.destination.clone()),
            credential: self
                .call
                .credential
                .clone()
                .or_else(|| self.base.credential.clone()),
            metadata,
            token_extractor: self
                .call
                .token_extractor
                .clone()
                .or_else(|| self.base.token_extractor.clone())
                .unwrap_or_default(),
            model_extractor: self
                .call
                .model_extractor
                .clone()
                .or_else(|| self.base.model_extractor.clone())
                .unwrap_or_default(),
        }
    }

    fn tracker_for(&self, runtime: Option<&Metadata>) -> Tracker {
        Tracker::with_channels(
            self.resolve(runtime),
            Arc::clone(&self.delivery),
            Arc::clone(&self.diagnostics),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
