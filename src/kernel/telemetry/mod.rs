//! Session telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside decision logic (reducer, buffer, aggregator).
//! It exists solely for observability and verification.
//!
//! Events carry sequence numbers, counts and action names only. No raw
//! vision matrices or audio payloads.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::TelemetryEvent;
pub use metrics::TelemetrySnapshot;
pub use recorder::TelemetryRecorder;
