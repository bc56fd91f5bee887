//! Ingest Pipeline: Validate → Derive → Classify → Append
//!
//! ## Overview
//!
//! [`IngestPipeline`] is the front door for arriving samples and the unit
//! of concurrency control. One call to [`IngestPipeline::submit`] takes a
//! producer's raw sample end to end:
//!
//! ```text
//! producer → validate → device state → derive → classify → append
//!               ↓            ↓                                ↓
//!            no state     per-device                    history window
//!            touched     critical section               (+ new baseline)
//! ```
//!
//! ## Ordering & Atomicity
//!
//! Validation runs strictly before any state is touched: an invalid
//! sample fails the submission with nothing to roll back. Past
//! validation, everything that mutates - reading the previous total,
//! writing the new one, appending to history - happens inside that one
//! device's critical section. A submission either fully commits one
//! device's state exactly once, or fails with no observable mutation.
//!
//! Concurrent submissions for the *same* device serialize in
//! lock-acquisition order; both commit, each differencing against the
//! other's committed total. Submissions for *different* devices proceed
//! independently (see `registry` for the locking layout).
//!
//! ## Bounded Waiting
//!
//! Acquiring a device's critical section waits at most the configured
//! lock timeout, then surfaces [`IngestError::Busy`]. A caller blocked
//! behind a pathological producer storm gets an explicit retryable error
//! instead of queueing forever; no data is dropped silently.

use std::boxed::Box;
use std::time::Duration;
use std::vec::Vec;

use log::{debug, warn};

use crate::{
    classify::AnomalyClassifier,
    constants::DEFAULT_LOCK_TIMEOUT_MS,
    derivative,
    errors::{IngestError, IngestResult},
    registry::DeviceRegistry,
    sample::{DerivedReading, DeviceId, RawSample},
    time::{SystemClock, TimeSource},
    validator,
};

/// The telemetry ingest pipeline
///
/// `N` is the per-device history capacity. Construct with
/// [`IngestPipeline::new`] for defaults, or [`IngestPipeline::builder`]
/// to install a custom clock, thresholds, or lock timeout:
///
/// ```
/// use joltguard_core::{IngestPipeline, RawSample};
///
/// let pipeline: IngestPipeline<20> = IngestPipeline::new();
/// let reading = pipeline
///     .submit(Some("imu-01"), RawSample::new(3.0, 4.0, 0.0))
///     .unwrap();
///
/// assert_eq!(reading.total_accel, 7.0);
/// assert_eq!(reading.dadt, 0.0); // first sample of the device's life
/// ```
pub struct IngestPipeline<const N: usize> {
    registry: DeviceRegistry<N>,
    classifier: AnomalyClassifier,
    clock: Box<dyn TimeSource + Send + Sync>,
    lock_timeout: Duration,
}

impl<const N: usize> IngestPipeline<N> {
    /// Create a pipeline with the default clock, thresholds, and timeout
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a pipeline
    pub fn builder() -> IngestPipelineBuilder<N> {
        IngestPipelineBuilder::new()
    }

    /// Ingest one sample for a device
    ///
    /// `device_id: None` (or an empty id) addresses the implicit default
    /// device, which keeps single-sensor producers working without any
    /// notion of identity.
    ///
    /// On success the freshly committed [`DerivedReading`] is returned to
    /// the caller; on failure nothing was mutated (see module docs).
    pub fn submit(&self, device_id: Option<&str>, raw: RawSample) -> IngestResult<DerivedReading> {
        validator::check(&raw)?;
        let id = resolve_device_id(device_id)?;

        let state = self.registry.get_or_create(id);
        let mut guard = match state.try_lock_for(self.lock_timeout) {
            Some(guard) => guard,
            None => {
                let waited_ms = self.lock_timeout.as_millis() as u32;
                warn!("device {id}: critical section not acquired in {waited_ms} ms");
                return Err(IngestError::Busy { waited_ms });
            }
        };

        let timestamp = guard.next_timestamp(self.clock.now());
        let derivation = derivative::update(guard.previous_total_accel(), &raw);
        let anomalous = self
            .classifier
            .classify(derivation.total_accel, derivation.dadt);

        let reading = DerivedReading {
            device_id: id,
            acceleration_x: raw.acceleration_x,
            acceleration_y: raw.acceleration_y,
            acceleration_z: raw.acceleration_z,
            vibration: raw.vibration,
            latitude: raw.latitude,
            longitude: raw.longitude,
            speed: raw.speed,
            altitude: raw.altitude,
            satellites: raw.satellites,
            total_accel: derivation.total_accel,
            dadt: derivation.dadt,
            anomalous,
            timestamp,
        };

        guard.commit(reading);
        drop(guard);

        if anomalous {
            warn!(
                "device {id}: abrupt stop flagged (total={:.2}, dadt={:.2})",
                reading.total_accel, reading.dadt
            );
        } else {
            debug!(
                "device {id}: reading committed (total={:.2}, dadt={:.2})",
                reading.total_accel, reading.dadt
            );
        }

        Ok(reading)
    }

    /// Recent readings for a device, newest first
    ///
    /// Returns at most `min(limit, N)` readings as a point-in-time copy;
    /// iterating it is unaffected by concurrent submissions. Fails with
    /// [`IngestError::UnknownDevice`] for a device that never submitted.
    pub fn history(
        &self,
        device_id: Option<&str>,
        limit: usize,
    ) -> IngestResult<Vec<DerivedReading>> {
        let id = resolve_device_id(device_id)?;
        let state = self.registry.get(&id)?;

        let guard = state
            .try_lock_for(self.lock_timeout)
            .ok_or(IngestError::Busy {
                waited_ms: self.lock_timeout.as_millis() as u32,
            })?;
        let snapshot = guard.history().snapshot();
        drop(guard);

        Ok(snapshot.iter().take(limit).copied().collect())
    }

    /// Ids of all devices that have submitted, in no particular order
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.registry.device_ids()
    }

    /// The underlying registry, for read-only inspection
    pub fn registry(&self) -> &DeviceRegistry<N> {
        &self.registry
    }
}

impl<const N: usize> Default for IngestPipeline<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_device_id(device_id: Option<&str>) -> IngestResult<DeviceId> {
    match device_id {
        None => Ok(DeviceId::default()),
        Some("") => Ok(DeviceId::default()),
        Some(s) => DeviceId::new(s).ok_or(IngestError::InvalidSample {
            reason: "device id too long",
        }),
    }
}

/// Builder for [`IngestPipeline`]
///
/// Defaults: system clock, default classifier thresholds,
/// [`DEFAULT_LOCK_TIMEOUT_MS`] bounded wait.
pub struct IngestPipelineBuilder<const N: usize> {
    classifier: AnomalyClassifier,
    clock: Box<dyn TimeSource + Send + Sync>,
    lock_timeout: Duration,
}

impl<const N: usize> IngestPipelineBuilder<N> {
    /// Create a builder with defaults
    pub fn new() -> Self {
        Self {
            classifier: AnomalyClassifier::default(),
            clock: Box::new(SystemClock),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }

    /// Install custom anomaly thresholds
    pub fn classifier(mut self, classifier: AnomalyClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Install a custom time source (tests pin a [`crate::time::FixedClock`])
    pub fn clock(mut self, clock: impl TimeSource + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Bound the wait for a device's critical section
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> IngestPipeline<N> {
        IngestPipeline {
            registry: DeviceRegistry::new(),
            classifier: self.classifier,
            clock: self.clock,
            lock_timeout: self.lock_timeout,
        }
    }
}

impl<const N: usize> Default for IngestPipelineBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}
