//! Delimited-Table Export of History Snapshots
//!
//! ## Contract
//!
//! Downstream tooling parses this output, so the shape is fixed and
//! documented here:
//!
//! - First line is always the header
//!   `Timestamp,AccelerationX,AccelerationY,AccelerationZ,TotalAcceleration,da/dt,Vibration,Latitude,Longitude,Speed,Altitude,Satellites`.
//! - One row per reading, in the order of the snapshot handed in (the
//!   pipeline's `history` hands them newest first).
//! - Every line, header and rows alike, ends with `\n`.
//! - Accelerations, total, da/dt, speed, and altitude print with 2
//!   decimals; latitude and longitude with 6 (a GPS fix is meaningful to
//!   ~0.1 m, accelerations are not).
//! - The vibration flag prints `Yes`/`No` by default, `true`/`false` via
//!   [`BoolStyle::TrueFalse`] for consumers that want to parse booleans.
//! - Absent optional fields print as empty cells; column positions never
//!   shift.
//!
//! The formatter writes into any [`core::fmt::Write`] sink, so it works
//! against a preallocated buffer as well as a `String`. Export failures
//! never touch pipeline state; a half-written sink is the caller's to
//! discard.

use core::fmt::{self, Write};

use thiserror_no_std::Error;

use crate::sample::DerivedReading;

/// The fixed header line (without trailing newline)
pub const EXPORT_HEADER: &str = "Timestamp,AccelerationX,AccelerationY,AccelerationZ,\
TotalAcceleration,da/dt,Vibration,Latitude,Longitude,Speed,Altitude,Satellites";

/// Export errors
///
/// Isolated from the ingest taxonomy: a formatting failure affects only
/// the export call, never stored state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportError {
    /// The underlying sink refused a write
    #[error("Formatting failed")]
    Format,
}

impl From<fmt::Error> for ExportError {
    fn from(_: fmt::Error) -> Self {
        Self::Format
    }
}

/// How boolean fields are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolStyle {
    /// `Yes` / `No`, matching the display layer
    #[default]
    YesNo,
    /// `true` / `false`, for consumers that parse booleans
    TrueFalse,
}

impl BoolStyle {
    const fn render(self, value: bool) -> &'static str {
        match (self, value) {
            (Self::YesNo, true) => "Yes",
            (Self::YesNo, false) => "No",
            (Self::TrueFalse, true) => "true",
            (Self::TrueFalse, false) => "false",
        }
    }
}

/// Snapshot-to-table formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportFormatter {
    bool_style: BoolStyle,
}

impl ExportFormatter {
    /// Create a formatter with the default `Yes`/`No` boolean style
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with an explicit boolean style
    pub fn with_bool_style(bool_style: BoolStyle) -> Self {
        Self { bool_style }
    }

    /// Write the header and one row per reading into `out`
    pub fn write_table<W: Write>(
        &self,
        out: &mut W,
        readings: &[DerivedReading],
    ) -> Result<(), ExportError> {
        out.write_str(EXPORT_HEADER)?;
        out.write_char('\n')?;

        for reading in readings {
            self.write_row(out, reading)?;
        }

        Ok(())
    }

    /// Render a snapshot to an owned string
    #[cfg(feature = "std")]
    pub fn render(&self, readings: &[DerivedReading]) -> Result<std::string::String, ExportError> {
        let mut out = std::string::String::new();
        self.write_table(&mut out, readings)?;
        Ok(out)
    }

    fn write_row<W: Write>(&self, out: &mut W, r: &DerivedReading) -> Result<(), ExportError> {
        write!(
            out,
            "{},{:.2},{:.2},{:.2},{:.2},{:.2},{}",
            r.timestamp,
            r.acceleration_x,
            r.acceleration_y,
            r.acceleration_z,
            r.total_accel,
            r.dadt,
            self.bool_style.render(r.vibration),
        )?;

        write_opt_cell(out, r.latitude, 6)?;
        write_opt_cell(out, r.longitude, 6)?;
        write_opt_cell(out, r.speed.map(f64::from), 2)?;
        write_opt_cell(out, r.altitude.map(f64::from), 2)?;

        match r.satellites {
            Some(n) => write!(out, ",{n}")?,
            None => out.write_char(',')?,
        }

        out.write_char('\n')?;
        Ok(())
    }
}

fn write_opt_cell<W: Write>(
    out: &mut W,
    value: Option<f64>,
    precision: usize,
) -> Result<(), ExportError> {
    match value {
        Some(v) => write!(out, ",{v:.precision$}")?,
        None => out.write_char(',')?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::DeviceId;

    fn reading() -> DerivedReading {
        DerivedReading {
            device_id: DeviceId::new("d1").unwrap(),
            acceleration_x: 3.0,
            acceleration_y: -4.0,
            acceleration_z: 0.5,
            vibration: true,
            latitude: Some(34.0522),
            longitude: Some(-118.2437),
            speed: Some(1.5),
            altitude: Some(120.0),
            satellites: Some(7),
            total_accel: 7.5,
            dadt: -2.5,
            anomalous: false,
            timestamp: 1000,
        }
    }

    #[test]
    fn header_matches_contract() {
        assert_eq!(
            EXPORT_HEADER,
            "Timestamp,AccelerationX,AccelerationY,AccelerationZ,TotalAcceleration,\
da/dt,Vibration,Latitude,Longitude,Speed,Altitude,Satellites"
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn full_row_rendering() {
        let table = ExportFormatter::new().render(&[reading()]).unwrap();
        let mut lines = table.lines();

        assert_eq!(lines.next(), Some(EXPORT_HEADER));
        assert_eq!(
            lines.next(),
            Some("1000,3.00,-4.00,0.50,7.50,-2.50,Yes,34.052200,-118.243700,1.50,120.00,7")
        );
        assert_eq!(lines.next(), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn absent_fields_are_empty_cells() {
        let r = DerivedReading {
            latitude: None,
            longitude: None,
            speed: None,
            altitude: None,
            satellites: None,
            vibration: false,
            ..reading()
        };

        let table = ExportFormatter::new().render(&[r]).unwrap();
        let row = table.lines().nth(1).unwrap();

        assert_eq!(row, "1000,3.00,-4.00,0.50,7.50,-2.50,No,,,,,");
        // Column count is stable even with everything absent
        assert_eq!(row.split(',').count(), 12);
    }

    #[cfg(feature = "std")]
    #[test]
    fn bool_styles() {
        let r = reading();

        let yes = ExportFormatter::new().render(&[r]).unwrap();
        assert!(yes.contains(",Yes,"));

        let parsed = ExportFormatter::with_bool_style(BoolStyle::TrueFalse)
            .render(&[r])
            .unwrap();
        assert!(parsed.contains(",true,"));
    }

    #[cfg(feature = "std")]
    #[test]
    fn rows_follow_snapshot_order() {
        let mut first = reading();
        first.timestamp = 2000;
        let mut second = reading();
        second.timestamp = 1000;

        let table = ExportFormatter::new().render(&[first, second]).unwrap();
        let rows: Vec<_> = table.lines().skip(1).collect();
        assert!(rows[0].starts_with("2000,"));
        assert!(rows[1].starts_with("1000,"));
    }
}
