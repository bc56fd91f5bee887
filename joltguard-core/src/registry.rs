//! Per-Device State Registry
//!
//! ## Overview
//!
//! The registry maps device identity to the one piece of mutable state the
//! pipeline keeps: the device's previous total acceleration, its last
//! assigned timestamp, and its history window. Entries are created lazily
//! on first sight of an id and live for the process lifetime; device
//! cardinality is bounded by physical sensors, not request volume, so
//! there is no eviction.
//!
//! ## Locking Discipline
//!
//! Two layers, with different jobs:
//!
//! - The registry map itself sits behind an `RwLock`. Lookups for known
//!   devices take the read side and run concurrently; only the first
//!   sample of a brand-new device takes the write side.
//! - Each [`DeviceState`] sits behind its own `Mutex`. The
//!   read-previous / compute / write-previous-and-append sequence for one
//!   device is a critical section under that mutex alone, so concurrent
//!   submissions for different devices never contend with each other. A
//!   single global lock around all device state is exactly the failure
//!   mode this layout exists to rule out.
//!
//! Map guards are dropped before any device mutex is taken, so there is no
//! lock-order cycle between the two layers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::{
    buffer::HistoryBuffer,
    errors::{IngestError, IngestResult},
    sample::{DerivedReading, DeviceId},
    time::Timestamp,
};

/// Mutable per-device state, guarded by the device's mutex
///
/// `previous_total_accel` starts unset so the device's first reading
/// reports a zero derivative instead of differencing against an arbitrary
/// baseline.
pub struct DeviceState<const N: usize> {
    previous_total_accel: Option<f32>,
    last_timestamp: Timestamp,
    history: HistoryBuffer<N>,
}

impl<const N: usize> DeviceState<N> {
    fn new() -> Self {
        Self {
            previous_total_accel: None,
            last_timestamp: 0,
            history: HistoryBuffer::new(),
        }
    }

    /// The device's previous total acceleration, unset before the first commit
    pub fn previous_total_accel(&self) -> Option<f32> {
        self.previous_total_accel
    }

    /// The device's history window
    pub fn history(&self) -> &HistoryBuffer<N> {
        &self.history
    }

    /// Timestamp for a reading arriving now
    ///
    /// Clamped against the last committed stamp so per-device timestamps
    /// never run backwards, whatever the installed clock does.
    pub fn next_timestamp(&self, now: Timestamp) -> Timestamp {
        now.max(self.last_timestamp)
    }

    /// Commit a derived reading: advance the previous total and append
    ///
    /// This is the whole write side of the critical section in one place;
    /// no caller can advance the baseline without appending or vice versa.
    /// The baseline always advances, anomalous readings included.
    pub fn commit(&mut self, reading: DerivedReading) {
        self.previous_total_accel = Some(reading.total_accel);
        self.last_timestamp = reading.timestamp;
        self.history.push(reading);
    }
}

/// Registry of all device states, keyed by inline device id
pub struct DeviceRegistry<const N: usize> {
    devices: RwLock<HashMap<DeviceId, Arc<Mutex<DeviceState<N>>>>>,
}

impl<const N: usize> DeviceRegistry<N> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a device's state, creating it on first sight
    ///
    /// The read side handles every sample after a device's first; the
    /// write side is taken only to insert, and re-checks under the write
    /// lock so two racing first-samples end up sharing one state.
    pub fn get_or_create(&self, id: DeviceId) -> Arc<Mutex<DeviceState<N>>> {
        if let Some(state) = self.devices.read().get(&id) {
            return Arc::clone(state);
        }

        let mut devices = self.devices.write();
        Arc::clone(
            devices
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(DeviceState::new()))),
        )
    }

    /// Fetch a device's state for read-only use
    ///
    /// Unlike submission, lookups do not create: asking for the history of
    /// a device that never submitted is a caller error.
    pub fn get(&self, id: &DeviceId) -> IngestResult<Arc<Mutex<DeviceState<N>>>> {
        self.devices
            .read()
            .get(id)
            .map(Arc::clone)
            .ok_or(IngestError::UnknownDevice)
    }

    /// Ids of all devices seen so far, in no particular order
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.read().keys().copied().collect()
    }

    /// Number of devices seen so far
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// Check if any device has been seen
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

impl<const N: usize> Default for DeviceRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_creation() {
        let registry: DeviceRegistry<4> = DeviceRegistry::new();
        assert!(registry.is_empty());

        let id = DeviceId::new("imu-01").unwrap();
        assert_eq!(registry.get(&id), Err(IngestError::UnknownDevice));

        let state = registry.get_or_create(id);
        assert_eq!(registry.len(), 1);
        assert!(state.lock().previous_total_accel().is_none());

        // Second fetch returns the same state, not a fresh one
        let again = registry.get_or_create(id);
        assert!(Arc::ptr_eq(&state, &again));

        // Read-only lookup now succeeds too
        assert!(registry.get(&id).is_ok());
    }

    #[test]
    fn distinct_ids_get_distinct_state() {
        let registry: DeviceRegistry<4> = DeviceRegistry::new();
        let a = registry.get_or_create(DeviceId::new("a").unwrap());
        let b = registry.get_or_create(DeviceId::new("b").unwrap());

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);

        let mut ids: Vec<_> = registry
            .device_ids()
            .iter()
            .map(|id| id.as_str().to_owned())
            .collect();
        ids.sort();
        assert_eq!(ids, ["a", "b"]);
    }

    fn reading(total: f32, timestamp: Timestamp) -> DerivedReading {
        DerivedReading {
            device_id: DeviceId::default(),
            acceleration_x: total,
            acceleration_y: 0.0,
            acceleration_z: 0.0,
            vibration: false,
            latitude: None,
            longitude: None,
            speed: None,
            altitude: None,
            satellites: None,
            total_accel: total,
            dadt: 0.0,
            anomalous: false,
            timestamp,
        }
    }

    #[test]
    fn commit_is_one_unit() {
        let registry: DeviceRegistry<4> = DeviceRegistry::new();
        let state = registry.get_or_create(DeviceId::default());
        let mut guard = state.lock();

        guard.commit(reading(7.0, 1000));

        // Baseline, stamp, and history all moved together
        assert_eq!(guard.previous_total_accel(), Some(7.0));
        assert_eq!(guard.history().len(), 1);
        assert_eq!(guard.history().last().unwrap().timestamp, 1000);
    }

    #[test]
    fn timestamps_never_run_backwards() {
        let registry: DeviceRegistry<4> = DeviceRegistry::new();
        let state = registry.get_or_create(DeviceId::default());
        let mut guard = state.lock();

        assert_eq!(guard.next_timestamp(1000), 1000);
        guard.commit(reading(5.0, 1000));

        // Clock stepped back; the device stamp holds the line
        assert_eq!(guard.next_timestamp(400), 1000);
    }
}
