//! CSV batch processing of spherical measurements.
//!
//! This module provides:
//! - A struct (`MeasurementRecord`) for reading spherical measurements from CSV files
//! - A struct (`JacobianRecord`) holding a measurement together with its Jacobian, written back to CSV
//! - `compute_jacobians` for evaluating a whole batch against one geometry
//!
//! Every input row produces an output row. Rows whose Jacobian is not finite (degenerate
//! geometry) are kept and reported through the `log` facade.
use crate::linearize::spher_conv_jacobian;
use crate::{Geometry, SphericalMeasurement};
use log::{debug, info, warn};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Single row of input data: `range,azimuth,elevation` (angles in radians).
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct MeasurementRecord {
    /// Range in meters, in the convention of the geometry it is processed with
    pub range: f64,
    /// Azimuth in radians
    pub azimuth: f64,
    /// Elevation in radians
    pub elevation: f64,
}

impl From<&MeasurementRecord> for SphericalMeasurement {
    fn from(record: &MeasurementRecord) -> Self {
        SphericalMeasurement::new(record.range, record.azimuth, record.elevation)
    }
}

impl MeasurementRecord {
    /// Reads a CSV file (with header) and returns a vector of `MeasurementRecord` structs.
    ///
    /// # Arguments
    /// * `path` - Path to the CSV file to read.
    ///
    /// # Returns
    /// * `Ok(Vec<MeasurementRecord>)` if successful.
    /// * `Err` if the file cannot be read or parsed.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Self>, Box<dyn std::error::Error>> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: Self = result?;
            records.push(record);
        }
        Ok(records)
    }

    /// Writes a slice of MeasurementRecord structs to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(records: &[Self], path: P) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// A measurement and its converted-measurement Jacobian, `jRC` being row R, column C.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct JacobianRecord {
    pub range: f64,
    pub azimuth: f64,
    pub elevation: f64,
    pub j00: f64,
    pub j01: f64,
    pub j02: f64,
    pub j10: f64,
    pub j11: f64,
    pub j12: f64,
    pub j20: f64,
    pub j21: f64,
    pub j22: f64,
}

impl JacobianRecord {
    pub fn new(measurement: &SphericalMeasurement, jacobian: &Matrix3<f64>) -> Self {
        JacobianRecord {
            range: measurement.range,
            azimuth: measurement.azimuth,
            elevation: measurement.elevation,
            j00: jacobian[(0, 0)],
            j01: jacobian[(0, 1)],
            j02: jacobian[(0, 2)],
            j10: jacobian[(1, 0)],
            j11: jacobian[(1, 1)],
            j12: jacobian[(1, 2)],
            j20: jacobian[(2, 0)],
            j21: jacobian[(2, 1)],
            j22: jacobian[(2, 2)],
        }
    }
    /// The Jacobian stored in this record.
    pub fn jacobian(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.j00, self.j01, self.j02, self.j10, self.j11, self.j12, self.j20, self.j21,
            self.j22,
        )
    }
    /// True when every Jacobian entry is finite.
    pub fn is_finite(&self) -> bool {
        self.jacobian().iter().all(|v| v.is_finite())
    }
    /// Reads Jacobian records from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Self>, Box<dyn std::error::Error>> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: Self = result?;
            records.push(record);
        }
        Ok(records)
    }
    /// Writes Jacobian records to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(records: &[Self], path: P) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Evaluate the converted-measurement Jacobian for every record against one geometry.
pub fn compute_jacobians(
    records: &[MeasurementRecord],
    geometry: &Geometry,
) -> Vec<JacobianRecord> {
    debug!("Computing {} Jacobians with {}", records.len(), geometry);
    let mut degenerate = 0usize;
    let results: Vec<JacobianRecord> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let measurement = SphericalMeasurement::from(record);
            let result = JacobianRecord::new(
                &measurement,
                &spher_conv_jacobian(&measurement, geometry),
            );
            if !result.is_finite() {
                degenerate += 1;
                warn!("Row {}: non-finite Jacobian for {}", i, measurement);
            }
            result
        })
        .collect();
    info!(
        "Computed {} Jacobians ({} degenerate)",
        results.len(),
        degenerate
    );
    results
}
