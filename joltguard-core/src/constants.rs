//! Constants for JoltGuard Core
//!
//! Centralized numeric values used throughout the crate, documented with
//! their purpose and provenance. Always use these instead of magic numbers;
//! when adding new constants, say where the value comes from.
//!
//! The anomaly thresholds deserve a caveat: they are empirical constants
//! tuned on one family of motion sensors, with no derivation from first
//! principles. They are therefore exposed as configuration defaults (see
//! [`crate::classify::AnomalyClassifier`]) rather than baked into the
//! classifier, and should not be assumed to generalize across hardware.

/// Default da/dt threshold for abrupt-stop classification
///
/// A reading is flagged only when the total-acceleration delta between
/// consecutive samples exceeds this value while the current total is below
/// [`DEFAULT_ACCEL_FLOOR`]. Unit: m/s² per sample interval.
pub const DEFAULT_DADT_THRESHOLD: f32 = 20.0;

/// Default total-acceleration ceiling for abrupt-stop classification
///
/// The "near-zero-force" side of the heuristic: the object must currently
/// be coasting for the jerk to count as an abrupt stop. Unit: m/s².
pub const DEFAULT_ACCEL_FLOOR: f32 = 5.0;

/// Default per-device history capacity (readings)
///
/// Matches the rolling window the display layer renders: 20 rows at the
/// default 5 s sample interval covers the last ~100 seconds.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Default bounded wait for a device's critical section (milliseconds)
///
/// A submission holds a device lock for a handful of float ops and one
/// buffer write, so 100 ms of waiting means a pathological producer storm;
/// callers get [`crate::IngestError::Busy`] instead of queueing forever.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_sane() {
        // The heuristic is "large jump while coasting"; the floor must sit
        // well below the jump threshold for the pair to mean anything.
        assert!(DEFAULT_ACCEL_FLOOR < DEFAULT_DADT_THRESHOLD);
        assert!(DEFAULT_HISTORY_CAPACITY > 0);
    }
}
