//! Telemetry Record Types
//!
//! Core types for the per-call telemetry payload: token usage counts and
//! the assembled record shipped to the telemetry backend.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-defined metadata attached to a telemetry record
pub type Metadata = Map<String, Value>;

/// Reserved metadata key for the call duration in milliseconds.
///
/// The wrapper always injects this key last; caller-provided values for
/// it are overwritten.
pub const DURATION_KEY: &str = "durationMs";

/// Reserved metadata key overriding the extracted model name.
///
/// Stripped from the metadata map before record assembly; its string
/// value, when present, takes precedence over any extracted model name.
pub const MODEL_NAME_KEY: &str = "modelName";

// ============================================================================
// Token Usage
// ============================================================================

/// Token usage for a single request/response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input/prompt tokens
    pub input_tokens: u32,
    /// Number of output/completion tokens
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Create a new token usage record
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used.
    ///
    /// Counts originate from untrusted responses, so the sum saturates
    /// rather than wrapping.
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

// ============================================================================
// Telemetry Record
// ============================================================================

/// The per-call usage payload shipped to the telemetry backend.
///
/// Serialized verbatim as the POST body: `functionName`, `inputTokens`,
/// `outputTokens`, `totalTokens`, `modelName`, `timestamp`, `metadata`.
/// `totalTokens` is always recomputed from the usage counts, never
/// supplied independently. A missing model name is a valid terminal
/// state, not an error; the field is omitted from the body when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    /// Caller-supplied identifier for the wrapped function
    pub function_name: String,
    /// Input/prompt tokens consumed
    pub input_tokens: u32,
    /// Output/completion tokens produced
    pub output_tokens: u32,
    /// Sum of input and output tokens
    pub total_tokens: u32,
    /// Resolved model identifier, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Capture time at record assembly (RFC 3339, millisecond precision, UTC)
    pub timestamp: String,
    /// Merged caller metadata plus the reserved duration key
    pub metadata: Metadata,
}

impl TelemetryRecord {
    /// Assemble a record for one completed call.
    ///
    /// Injects [`DURATION_KEY`] into `metadata` last, overwriting any
    /// caller-provided value, and stamps the current UTC time.
    pub fn new(
        function_name: &str,
        usage: TokenUsage,
        model_name: Option<String>,
        mut metadata: Metadata,
        duration_ms: u64,
    ) -> Self {
        metadata.insert(DURATION_KEY.to_string(), Value::from(duration_ms));

        Self {
            function_name: function_name.to_string(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total(),
            model_name,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
