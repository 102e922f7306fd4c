//! Extraction Strategies
//!
//! Pure, total strategies mapping an opaque provider response to token
//! counts or a model name. Response shapes vary by provider, so each
//! strategy is a named variant keyed on documented fields, with a
//! `Custom` escape hatch for shapes the built-ins do not cover.
//!
//! Strategies never fail: an unrecognized shape degrades to zero counts
//! (or an absent model name) with a diagnostic warning, and the wrapped
//! call is unaffected.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::diagnostics::DiagnosticSink;
use crate::record::{TokenUsage, MODEL_NAME_KEY};

/// Custom token extraction closure over an opaque response value
pub type TokenFn = dyn Fn(&Value) -> Option<TokenUsage> + Send + Sync;

/// Custom model-name extraction closure over an opaque response value
pub type ModelFn = dyn Fn(&Value) -> Option<String> + Send + Sync;

// ============================================================================
// Token Extraction
// ============================================================================

/// Strategy for deriving token counts from a provider response.
///
/// Built-in variants and the keys they check:
///
/// | Variant     | Container       | Input key          | Output key              |
/// |-------------|-----------------|--------------------|-------------------------|
/// | `OpenAi`    | `usage`         | `prompt_tokens`    | `completion_tokens`     |
/// | `Anthropic` | `usage`         | `input_tokens`     | `output_tokens`         |
/// | `Gemini`    | `usageMetadata` | `promptTokenCount` | `candidatesTokenCount`  |
#[derive(Clone, Default)]
pub enum TokenExtractor {
    /// OpenAI-style `usage.prompt_tokens` / `usage.completion_tokens` (default)
    #[default]
    OpenAi,
    /// Anthropic-style `usage.input_tokens` / `usage.output_tokens`
    Anthropic,
    /// Gemini-style `usageMetadata.promptTokenCount` / `usageMetadata.candidatesTokenCount`
    Gemini,
    /// Caller-supplied strategy for unsupported response shapes
    Custom(Arc<TokenFn>),
}

impl TokenExtractor {
    /// Derive token counts from `response`.
    ///
    /// Total over all inputs: an unrecognized shape yields zero counts
    /// and a diagnostic warning rather than an error.
    pub fn extract(&self, response: &Value, diagnostics: &dyn DiagnosticSink) -> TokenUsage {
        let usage = match self {
            Self::OpenAi => counts_at(response, "usage", "prompt_tokens", "completion_tokens"),
            Self::Anthropic => counts_at(response, "usage", "input_tokens", "output_tokens"),
            Self::Gemini => counts_at(
                response,
                "usageMetadata",
                "promptTokenCount",
                "candidatesTokenCount",
            ),
            Self::Custom(extract) => extract(response),
        };

        match usage {
            Some(usage) => usage,
            None => {
                diagnostics.warn(&format!(
                    "no token usage found in response ({} strategy); recording zero counts",
                    self
                ));
                TokenUsage::default()
            }
        }
    }
}

impl fmt::Display for TokenExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Gemini => write!(f, "gemini"),
            Self::Custom(_) => write!(f, "custom"),
        }
    }
}

impl fmt::Debug for TokenExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "TokenExtractor::OpenAi"),
            Self::Anthropic => write!(f, "TokenExtractor::Anthropic"),
            Self::Gemini => write!(f, "TokenExtractor::Gemini"),
            Self::Custom(_) => write!(f, "TokenExtractor::Custom(..)"),
        }
    }
}

/// Read an input/output count pair nested under `container`.
///
/// Returns `None` when neither key is present; a single missing key
/// degrades to zero for that side only.
fn counts_at(response: &Value, container: &str, input_key: &str, output_key: &str) -> Option<TokenUsage> {
    let usage = response.get(container)?.as_object()?;
    let input = usage.get(input_key).and_then(Value::as_u64);
    let output = usage.get(output_key).and_then(Value::as_u64);

    if input.is_none() && output.is_none() {
        return None;
    }

    Some(TokenUsage::new(
        saturate(input.unwrap_or(0)),
        saturate(output.unwrap_or(0)),
    ))
}

/// Clamp an untrusted count into the record's range instead of
/// truncating.
fn saturate(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

// ============================================================================
// Model Extraction
// ============================================================================

/// Strategy for deriving the model identifier from a provider response
#[derive(Clone, Default)]
pub enum ModelExtractor {
    /// Top-level `model` string field (OpenAI/Anthropic bodies; default)
    #[default]
    ResponseField,
    /// The response never identifies the model; callers must supply it
    /// via the `modelName` metadata key instead (e.g. Gemini bodies)
    MetadataOnly,
    /// Caller-supplied strategy for unsupported response shapes
    Custom(Arc<ModelFn>),
}

impl ModelExtractor {
    /// Derive the model name from `response`, or `None` when absent.
    ///
    /// Absence is a valid terminal state, surfaced only as a diagnostic.
    pub fn extract(&self, response: &Value, diagnostics: &dyn DiagnosticSink) -> Option<String> {
        match self {
            Self::ResponseField => {
                let model = response
                    .get("model")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if model.is_none() {
                    diagnostics.warn("no model field in response; model name omitted");
                }
                model
            }
            Self::MetadataOnly => {
                diagnostics.warn(&format!(
                    "this provider's responses do not identify the model; \
                     set the {} metadata key to record it",
                    MODEL_NAME_KEY
                ));
                None
            }
            Self::Custom(extract) => extract(response),
        }
    }
}

impl fmt::Debug for ModelExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseField => write!(f, "ModelExtractor::ResponseField"),
            Self::MetadataOnly => write!(f, "ModelExtractor::MetadataOnly"),
            Self::Custom(_) => write!(f, "ModelExtractor::Custom(..)"),
        }
    }
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Built-in providers with known response shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages
    Anthropic,
    /// Google Gemini generateContent
    Gemini,
}

impl Provider {
    /// Token extraction strategy for this provider
    pub fn token_extractor(self) -> TokenExtractor {
        match self {
            Self::OpenAi => TokenExtractor::OpenAi,
            Self::Anthropic => TokenExtractor::Anthropic,
            Self::Gemini => TokenExtractor::Gemini,
        }
    }

    /// Model extraction strategy for this provider
    pub fn model_extractor(self) -> ModelExtractor {
        match self {
            // Gemini bodies carry usage metadata but no model identity
            Self::Gemini => ModelExtractor::MetadataOnly,
            Self::OpenAi | Self::Anthropic => ModelExtractor::ResponseField,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
