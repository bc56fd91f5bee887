//! Time sources for ingest timestamping
//!
//! Readings are stamped at ingest, not at the producer: wall clocks on
//! sensor hardware drift and some producers send no time at all. The
//! pipeline asks a [`TimeSource`] for "now" and then clamps per device so
//! stored timestamps never run backwards (see `pipeline`).

/// Timestamp in milliseconds since epoch (or device boot for monotonic sources)
pub type Timestamp = u64;

/// Source of time for the ingest pipeline
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs monotonic)
    fn is_wall_clock(&self) -> bool;
}

#[cfg(feature = "std")]
impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
///
/// Interior mutability keeps the source usable behind the shared reference
/// the pipeline holds.
#[derive(Debug, Default)]
pub struct FixedClock {
    timestamp: core::sync::atomic::AtomicU64,
}

impl FixedClock {
    /// Create a source pinned at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: core::sync::atomic::AtomicU64::new(timestamp),
        }
    }

    /// Pin the source at a new timestamp
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp
            .store(timestamp, core::sync::atomic::Ordering::Relaxed);
    }

    /// Advance the source by `ms` milliseconds
    pub fn advance(&self, ms: u64) {
        self.timestamp
            .fetch_add(ms, core::sync::atomic::Ordering::Relaxed);
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.timestamp.load(core::sync::atomic::Ordering::Relaxed)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}
