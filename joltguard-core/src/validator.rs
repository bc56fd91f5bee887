//! Sample validation
//!
//! Enforces the one hard requirement on inbound samples: the three
//! acceleration axes must be present and finite. NaN or infinity in an
//! axis would poison every later total and derivative for that device, so
//! the pipeline runs this check strictly before touching any state.
//!
//! Optional fields are never validated here; the lenient deserialization
//! in `sample` already degraded anything unusable to unset.

use crate::{
    errors::{IngestError, IngestResult},
    sample::RawSample,
};

/// Check that a sample's required fields are usable
///
/// Pure and side-effect free: a failed check leaves nothing to undo.
pub fn check(sample: &RawSample) -> IngestResult<()> {
    require_finite(sample.acceleration_x, "accelerationX not finite")?;
    require_finite(sample.acceleration_y, "accelerationY not finite")?;
    require_finite(sample.acceleration_z, "accelerationZ not finite")?;
    Ok(())
}

fn require_finite(value: f32, reason: &'static str) -> IngestResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(IngestError::InvalidSample { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_samples() {
        assert!(check(&RawSample::new(3.0, 4.0, 0.0)).is_ok());
        assert!(check(&RawSample::new(0.0, 0.0, 0.0)).is_ok());
        assert!(check(&RawSample::new(-9.81, 0.0, 0.2)).is_ok());
    }

    #[test]
    fn rejects_non_finite_axes() {
        let nan = check(&RawSample::new(f32::NAN, 0.0, 0.0));
        assert_eq!(
            nan,
            Err(IngestError::InvalidSample {
                reason: "accelerationX not finite"
            })
        );

        assert!(check(&RawSample::new(0.0, f32::INFINITY, 0.0)).is_err());
        assert!(check(&RawSample::new(0.0, 0.0, f32::NEG_INFINITY)).is_err());
    }

    #[test]
    fn optional_fields_never_fail() {
        let sample = RawSample {
            latitude: Some(f64::NAN),
            ..RawSample::new(1.0, 1.0, 1.0)
        };
        // Optional fields are context, not inputs to the derivative
        assert!(check(&sample).is_ok());
    }
}
