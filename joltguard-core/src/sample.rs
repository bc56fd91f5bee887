//! Sample and Reading Types for the Telemetry Pipeline
//!
//! ## Overview
//!
//! Two records flow through the system:
//!
//! - [`RawSample`] is what a producer sends: three acceleration axes plus
//!   whatever GPS context the device had at that moment. It is transient
//!   and never stored beyond one pipeline pass.
//! - [`DerivedReading`] is what the pipeline stores and returns: the raw
//!   fields echoed back, plus the derived total acceleration, its finite
//!   difference, the anomaly flag, and the ingest timestamp. Immutable
//!   once constructed, owned by the history buffer it lands in.
//!
//! ## Field Tolerance
//!
//! Producers are embedded devices on flaky links; half a GPS fix is still
//! a usable motion sample. Deserialization is therefore lenient on the
//! optional fields: absent, null, or unparseable values become unset
//! without failing the sample. Only the three acceleration axes are
//! mandatory, and those are enforced by `validator` before any state is
//! touched.
//!
//! ## Memory Model
//!
//! Both records are plain Copy structs. [`DerivedReading`] stays under
//! 96 bytes so a full default history window (20 readings) costs under
//! 2 KB per device, and snapshots are cheap memcpys.

use crate::time::Timestamp;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum length for inline device ids
///
/// Ids longer than this are rejected at ingest (`InvalidSample`)
pub const MAX_DEVICE_ID: usize = 15;

/// Device identity: an inline string key
///
/// Avoids heap allocation so readings stay Copy and the registry key is
/// hashable without borrowing. Producers that send no id map to
/// [`DeviceId::default`], which preserves single-sensor deployments where
/// the notion of a device id never comes up.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    len: u8,
    data: [u8; MAX_DEVICE_ID],
}

impl DeviceId {
    /// Id assigned to producers that do not identify themselves
    pub const DEFAULT: &'static str = "default";

    /// Create from string slice
    ///
    /// Returns `None` if `s` exceeds [`MAX_DEVICE_ID`] bytes.
    pub fn new(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_DEVICE_ID {
            return None;
        }

        let mut data = [0u8; MAX_DEVICE_ID];
        data[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// Get as string slice
    pub fn as_str(&self) -> &str {
        // new() only stores whole &str bytes, so this is always valid UTF-8
        core::str::from_utf8(&self.data[..self.len as usize])
            .expect("DeviceId contains invalid UTF-8")
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new(Self::DEFAULT).expect("default id fits inline")
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl Serialize for DeviceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl serde::de::Visitor<'_> for IdVisitor {
            type Value = DeviceId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a device id of at most {} bytes", MAX_DEVICE_ID)
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                DeviceId::new(v).ok_or_else(|| E::custom("device id too long"))
            }
        }

        deserializer.deserialize_str(IdVisitor)
    }
}

/// One motion sample as sent by a producer
///
/// The three acceleration axes are required and must be finite; everything
/// else is optional context. See the module docs for the leniency rules.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RawSample {
    /// Acceleration along X in m/s²
    pub acceleration_x: f32,
    /// Acceleration along Y in m/s²
    pub acceleration_y: f32,
    /// Acceleration along Z in m/s²
    pub acceleration_z: f32,

    /// Vibration switch state; absent means not vibrating
    #[cfg_attr(feature = "serde", serde(default))]
    pub vibration: bool,

    /// GPS latitude in degrees, if the device had a fix
    ///
    /// f64: the export contract prints six decimals, past f32 precision.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::option_f64",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub latitude: Option<f64>,

    /// GPS longitude in degrees, if the device had a fix
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::option_f64",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub longitude: Option<f64>,

    /// Ground speed in m/s
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::option_f32",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub speed: Option<f32>,

    /// Altitude above sea level in meters
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::option_f32",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub altitude: Option<f32>,

    /// Number of GPS satellites in view
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::option_u8",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub satellites: Option<u8>,
}

impl RawSample {
    /// Convenience constructor for the required fields only
    pub fn new(acceleration_x: f32, acceleration_y: f32, acceleration_z: f32) -> Self {
        Self {
            acceleration_x,
            acceleration_y,
            acceleration_z,
            ..Self::default()
        }
    }

    /// Parse a sample from its JSON wire form
    ///
    /// Required fields missing or malformed fail the whole sample; optional
    /// fields degrade to unset per the module leniency rules.
    #[cfg(feature = "std")]
    pub fn from_json(payload: &str) -> crate::errors::IngestResult<Self> {
        serde_json::from_str(payload).map_err(|_| crate::errors::IngestError::InvalidSample {
            reason: "malformed sample payload",
        })
    }
}

/// One derived reading as stored and returned by the pipeline
///
/// All producer fields echoed, plus the derived values. `dadt` is always
/// computed against the same device's previous total, never another
/// device's; the first reading of a device's life carries `dadt == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DerivedReading {
    /// Device this reading belongs to
    pub device_id: DeviceId,
    /// Acceleration along X in m/s²
    pub acceleration_x: f32,
    /// Acceleration along Y in m/s²
    pub acceleration_y: f32,
    /// Acceleration along Z in m/s²
    pub acceleration_z: f32,
    /// Vibration switch state
    pub vibration: bool,
    /// GPS latitude in degrees
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub latitude: Option<f64>,
    /// GPS longitude in degrees
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub longitude: Option<f64>,
    /// Ground speed in m/s
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub speed: Option<f32>,
    /// Altitude above sea level in meters
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub altitude: Option<f32>,
    /// Number of GPS satellites in view
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub satellites: Option<u8>,

    /// Total acceleration: |x| + |y| + |z|, always ≥ 0
    pub total_accel: f32,
    /// Finite difference of total acceleration against the device's
    /// previous reading; 0 for the first reading
    pub dadt: f32,
    /// Abrupt-stop flag from the anomaly classifier
    pub anomalous: bool,
    /// Ingest timestamp in ms, non-decreasing per device
    pub timestamp: Timestamp,
}

impl DerivedReading {
    /// Serialize to the JSON wire form echoed to producers
    #[cfg(feature = "std")]
    pub fn to_json(&self) -> Result<std::string::String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Lenient deserializers for optional telemetry fields
///
/// GPS modules losing their fix produce nulls, empty strings, or string
/// encoded numbers depending on firmware. Anything scalar that does not
/// parse as a number simply leaves the field unset.
#[cfg(feature = "serde")]
mod lenient {
    use core::fmt;
    use serde::de::{Deserializer, Error, Visitor};

    struct LenientNumber;

    impl<'de> Visitor<'de> for LenientNumber {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number, numeric string, or null")
        }

        fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().parse().ok())
        }

        fn visit_bool<E: Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(LenientNumber)
        }
    }

    pub fn option_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        d.deserialize_any(LenientNumber)
    }

    pub fn option_f32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
        Ok(option_f64(d)?.map(|v| v as f32))
    }

    pub fn option_u8<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u8>, D::Error> {
        // Satellite counts are small non-negative integers; anything else
        // is a firmware glitch and degrades to unset
        Ok(option_f64(d)?.and_then(|v| {
            if v.fract() == 0.0 && (0.0..=255.0).contains(&v) {
                Some(v as u8)
            } else {
                None
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_inline() {
        let id = DeviceId::new("imu-01").unwrap();
        assert_eq!(id.as_str(), "imu-01");

        // Too long
        assert!(DeviceId::new("this-device-id-is-way-too-long").is_none());

        assert_eq!(DeviceId::default().as_str(), "default");
    }

    #[test]
    fn reading_size() {
        // A default history window (20 readings) should stay under ~2 KB
        assert!(core::mem::size_of::<DerivedReading>() <= 96);
    }

    #[cfg(feature = "std")]
    #[test]
    fn sample_from_json_required_fields() {
        let sample =
            RawSample::from_json(r#"{"accelerationX":3.0,"accelerationY":4.0,"accelerationZ":0.0}"#)
                .unwrap();
        assert_eq!(sample.acceleration_x, 3.0);
        assert!(!sample.vibration);
        assert_eq!(sample.latitude, None);

        // Missing a required axis fails the whole sample
        assert!(RawSample::from_json(r#"{"accelerationX":3.0,"accelerationY":4.0}"#).is_err());
    }

    #[cfg(feature = "std")]
    #[test]
    fn sample_from_json_lenient_optionals() {
        let sample = RawSample::from_json(
            r#"{
                "accelerationX": 1, "accelerationY": 2, "accelerationZ": 3,
                "vibration": true,
                "latitude": "34.0522", "longitude": null,
                "speed": "not a number", "altitude": 120.5,
                "satellites": 7.0
            }"#,
        )
        .unwrap();

        assert!(sample.vibration);
        assert_eq!(sample.latitude, Some(34.0522));
        assert_eq!(sample.longitude, None);
        assert_eq!(sample.speed, None);
        assert_eq!(sample.altitude, Some(120.5));
        assert_eq!(sample.satellites, Some(7));
    }

    #[cfg(feature = "std")]
    #[test]
    fn sample_from_json_rejects_fractional_satellites() {
        let sample = RawSample::from_json(
            r#"{"accelerationX":0,"accelerationY":0,"accelerationZ":0,"satellites":7.5}"#,
        )
        .unwrap();
        assert_eq!(sample.satellites, None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn reading_json_echo() {
        let reading = DerivedReading {
            device_id: DeviceId::new("d1").unwrap(),
            acceleration_x: 3.0,
            acceleration_y: 4.0,
            acceleration_z: 0.0,
            vibration: false,
            latitude: None,
            longitude: None,
            speed: None,
            altitude: None,
            satellites: None,
            total_accel: 7.0,
            dadt: 0.0,
            anomalous: false,
            timestamp: 1000,
        };

        let json = reading.to_json().unwrap();
        assert!(json.contains(r#""deviceId":"d1""#));
        assert!(json.contains(r#""totalAccel":7.0"#));
        assert!(json.contains(r#""dadt":0.0"#));
        // Unset optionals are omitted, not null
        assert!(!json.contains("latitude"));
    }
}
