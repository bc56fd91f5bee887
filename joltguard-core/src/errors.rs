//! Error Types for the Ingest Pipeline
//!
//! ## Design Philosophy
//!
//! The error system follows a few rules that keep it cheap to return from
//! hot paths and unambiguous to act on:
//!
//! 1. **Small Size**: Every variant carries at most a few machine words.
//!    Errors are returned per submission and may be counted or queued.
//!
//! 2. **No Heap Allocation**: All error data is inline - no String, only
//!    `&'static str` for reasons. Memory usage stays deterministic.
//!
//! 3. **Copy Semantics**: Errors implement Copy so they can be returned
//!    and stored without move complications.
//!
//! 4. **Machine-Readable Kind**: Callers match on the variant, not on a
//!    message. Retry decisions differ per kind:
//!    - [`IngestError::InvalidSample`]: client-side input error; retry
//!      only with corrected input. No state was mutated.
//!    - [`IngestError::UnknownDevice`]: read-only lookup against a device
//!      never seen. Submission never raises this (it creates on first use).
//!    - [`IngestError::Busy`]: the device's critical section could not be
//!      acquired within the bounded wait; safe to retry as-is.
//!
//! None of these are fatal: a failed submission affects only that
//! submission, and partial mutation is impossible (validation precedes any
//! state access, and the per-device critical section commits all-or-nothing).

use thiserror_no_std::Error;

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Ingest errors - kept small and Copy for hot-path returns
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestError {
    /// Required fields missing or non-finite; nothing was mutated
    #[error("Invalid sample: {reason}")]
    InvalidSample {
        /// What the sample failed on
        reason: &'static str,
    },

    /// Read-only lookup against a device id that has never submitted
    #[error("Unknown device")]
    UnknownDevice,

    /// Per-device critical section not acquired within the bounded wait
    #[error("Device busy: gave up after {waited_ms} ms")]
    Busy {
        /// How long the caller waited before giving up
        waited_ms: u32,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for IngestError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidSample { reason } => defmt::write!(fmt, "Invalid sample: {}", reason),
            Self::UnknownDevice => defmt::write!(fmt, "Unknown device"),
            Self::Busy { waited_ms } => defmt::write!(fmt, "Busy after {} ms", waited_ms),
        }
    }
}
