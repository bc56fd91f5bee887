//! Core telemetry engine for JoltGuard
//!
//! Ingests periodic motion-sensor samples (tri-axial acceleration plus GPS
//! context) from concurrent producers, derives total acceleration and its
//! finite difference per device, flags abrupt-stop anomalies, and keeps a
//! bounded newest-first history window per device for display and export.
//!
//! Key properties:
//! - Per-device derivative state: one producer can never cross-wire
//!   another's da/dt
//! - Per-device critical sections with bounded waits; devices never block
//!   each other
//! - Fixed-capacity history windows, no unbounded growth
//!
//! ```
//! use joltguard_core::{ExportFormatter, IngestPipeline, RawSample};
//!
//! let pipeline: IngestPipeline<20> = IngestPipeline::new();
//!
//! pipeline.submit(Some("imu-01"), RawSample::new(3.0, 4.0, 0.0)).unwrap();
//! pipeline.submit(Some("imu-01"), RawSample::new(0.0, 0.0, 0.0)).unwrap();
//!
//! let history = pipeline.history(Some("imu-01"), 20).unwrap();
//! assert_eq!(history[0].dadt, -7.0); // newest first
//!
//! let table = ExportFormatter::new().render(&history).unwrap();
//! assert!(table.starts_with("Timestamp,"));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod classify;
pub mod constants;
pub mod derivative;
pub mod errors;
pub mod export;
pub mod sample;
pub mod time;
pub mod validator;

#[cfg(feature = "std")]
pub mod pipeline;
#[cfg(feature = "std")]
pub mod registry;

// Public API
pub use classify::AnomalyClassifier;
pub use errors::{IngestError, IngestResult};
pub use export::{BoolStyle, ExportError, ExportFormatter};
pub use sample::{DerivedReading, DeviceId, RawSample};

#[cfg(feature = "std")]
pub use pipeline::{IngestPipeline, IngestPipelineBuilder};
#[cfg(feature = "std")]
pub use registry::DeviceRegistry;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
