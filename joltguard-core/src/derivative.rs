//! Total-Acceleration Derivative Kernel
//!
//! ## Overview
//!
//! The scalar that everything downstream keys on is "total acceleration":
//! the sum of the absolute values of the three axis readings. Its first
//! finite difference between consecutive samples of the same device
//! ("da/dt") is what the abrupt-stop classifier consumes.
//!
//! ## Statelessness
//!
//! These are pure functions of (previous, sample). The per-device previous
//! value they difference against lives in `DeviceState`, never in here, so
//! the kernel is reentrant and trivially testable: there is no hidden
//! global that two concurrent devices could trample (keeping one shared
//! previous across all producers would silently cross-wire their
//! derivatives).
//!
//! ## Initial-Sample Policy
//!
//! The first sample of a device's life has nothing to difference against.
//! It reports `dadt == 0` rather than a spurious jump from an arbitrary
//! baseline, and its total becomes the baseline for the next sample.
//!
//! Note: `libm` is used for the absolute values so the kernel works
//! without std.

use crate::sample::RawSample;

/// Derived values for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derivation {
    /// |x| + |y| + |z|, always ≥ 0
    pub total_accel: f32,
    /// total_accel minus the device's previous total; 0 on first sample
    pub dadt: f32,
}

/// Total acceleration of one sample: |x| + |y| + |z|
pub fn total_acceleration(sample: &RawSample) -> f32 {
    libm::fabsf(sample.acceleration_x)
        + libm::fabsf(sample.acceleration_y)
        + libm::fabsf(sample.acceleration_z)
}

/// Compute the derived values for a sample against a device's previous total
///
/// The caller always advances its stored previous to
/// [`Derivation::total_accel`] afterwards, whether or not the reading ends
/// up classified anomalous.
pub fn update(previous: Option<f32>, sample: &RawSample) -> Derivation {
    let total_accel = total_acceleration(sample);
    let dadt = match previous {
        Some(prev) => total_accel - prev,
        None => 0.0,
    };

    Derivation { total_accel, dadt }
}
