//! tokenmeter - Usage Telemetry for LLM API Calls
//!
//! Wraps an asynchronous call (typically an LLM API invocation) to
//! capture usage telemetry - token counts, model identity, latency -
//! without altering the call's behavior or signature.
//!
//! # Guarantees
//!
//! - The caller sees exactly the same success/failure as the unwrapped
//!   call: results pass through unchanged, errors are never wrapped.
//! - Telemetry is best-effort. Records are delivered on a detached task
//!   that is never awaited by the caller path; delivery failures are
//!   visible only to the diagnostic sink.
//! - Extraction strategies are total: unrecognized response shapes
//!   degrade to zero counts with a diagnostic, never an error.
//!
//! # Example
//!
//! ```no_run
//! use tokenmeter::{BaseConfig, CallConfig, Provider, TrackerFactory};
//!
//! # async fn call_provider() -> Result<serde_json::Value, String> { unimplemented!() }
//! # async fn example() -> Result<(), String> {
//! let factory = TrackerFactory::new(
//!     BaseConfig::new("https://telemetry.example/events")
//!         .with_credential("api-token")
//!         .for_provider(Provider::OpenAi),
//! );
//!
//! let tracked = factory.tracker(CallConfig::new("chat_completion"));
//! let response = tracked.call(|| call_provider()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod delivery;
pub mod diagnostics;
pub mod extract;
pub mod factory;
pub mod record;
pub mod tracker;

// Re-export the public surface
pub use config::{merge_metadata, take_model_override, TrackerConfig};
pub use delivery::{DeliveryChannel, DeliveryError, DeliveryResult, HttpDelivery};
pub use diagnostics::{BufferSink, DiagnosticSink, LogSink};
pub use extract::{ModelExtractor, Provider, TokenExtractor};
pub use factory::{BaseConfig, CallConfig, ConfiguredTracker, TrackerFactory};
pub use record::{Metadata, TelemetryRecord, TokenUsage, DURATION_KEY, MODEL_NAME_KEY};
pub use tracker::{track, Tracker};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
