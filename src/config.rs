//! Tracker Configuration
//!
//! A [`TrackerConfig`] is fully resolved before the wrapped function
//! runs its first call; merging never happens mid-flight. The factory
//! (see [`crate::factory`]) layers base, call-specific, and runtime
//! metadata into one of these per invocation.

use serde_json::Value;

use crate::extract::{ModelExtractor, Provider, TokenExtractor};
use crate::record::{Metadata, MODEL_NAME_KEY};

/// Fully resolved configuration for one tracking wrapper
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Caller-supplied identifier for the wrapped function (descriptive,
    /// not enforced unique)
    pub function_name: String,
    /// Telemetry endpoint the delivery channel ships records to
    pub destination: String,
    /// Opaque bearer credential attached to deliveries, if any
    pub credential: Option<String>,
    /// Caller metadata merged into every record
    pub metadata: Metadata,
    /// Token extraction strategy for the response shape
    pub token_extractor: TokenExtractor,
    /// Model extraction strategy for the response shape
    pub model_extractor: ModelExtractor,
}

impl TrackerConfig {
    /// Create a configuration with default (OpenAI-shaped) extractors
    pub fn new(function_name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            destination: destination.into(),
            credential: None,
            metadata: Metadata::new(),
            token_extractor: TokenExtractor::default(),
            model_extractor: ModelExtractor::default(),
        }
    }

    /// Attach a bearer credential for delivery
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Replace the metadata map
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Insert a single metadata entry
    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Override the token extraction strategy
    pub fn with_token_extractor(mut self, extractor: TokenExtractor) -> Self {
        self.token_extractor = extractor;
        self
    }

    /// Override the model extraction strategy
    pub fn with_model_extractor(mut self, extractor: ModelExtractor) -> Self {
        self.model_extractor = extractor;
        self
    }

    /// Use both extraction strategies registered for `provider`
    pub fn for_provider(mut self, provider: Provider) -> Self {
        self.token_extractor = provider.token_extractor();
        self.model_extractor = provider.model_extractor();
        self
    }
}

// ============================================================================
// Metadata Merging
// ============================================================================

/// Merge metadata layers in order of increasing precedence.
///
/// Later layers override matching keys; non-overlapping keys from all
/// layers are preserved.
pub fn merge_metadata(layers: &[&Metadata]) -> Metadata {
    let mut merged = Metadata::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Strip the reserved `modelName` key from `metadata`, returning its
/// string value as the model-name override when present.
///
/// Non-string values are removed but yield no override.
pub fn take_model_override(metadata: &mut Metadata) -> Option<String> {
    match metadata.remove(MODEL_NAME_KEY) {
        Some(Value::String(model)) => Some(model),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
