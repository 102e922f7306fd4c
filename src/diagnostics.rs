//! Diagnostic Output Capability
//!
//! Telemetry is best-effort: extraction ambiguity and delivery failures
//! are surfaced as human-readable diagnostics, never as errors to the
//! caller. The sink is injected so tests can assert on emitted messages
//! without capturing process-wide output.

use std::sync::Mutex;

/// Receives human-readable warning/error messages from the tracker
pub trait DiagnosticSink: Send + Sync {
    /// Data-quality conditions (missing usage fields, unknown shapes)
    fn warn(&self, message: &str);
    /// Failures (target errors, delivery failures)
    fn error(&self, message: &str);
}

/// Default sink routing diagnostics to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// In-memory sink capturing diagnostics for assertions in tests
#[derive(Debug, Default)]
pub struct BufferSink {
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl BufferSink {
    /// Create an empty capturing sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings captured so far
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Errors captured so far
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Whether nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.warnings().is_empty() && self.errors().is_empty()
    }
}

impl DiagnosticSink for BufferSink {
    fn warn(&self, message: &str) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(message.to_string());
        }
    }

    fn error(&self, message: &str) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(message.to_string());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
