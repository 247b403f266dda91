//! Converted-measurement Jacobians for monostatic and bistatic radar/sonar geometries
//!
//! This crate computes the 3×3 Jacobian relating a Cartesian target position to a spherical
//! measurement of range, azimuth and elevation taken by a receiver that may or may not be
//! co-located with its transmitter. Trackers that run in Cartesian coordinates on converted
//! measurements, while the clutter density is specified in the measurement (spherical)
//! coordinate system, need this local linearization to move between the two spaces. The crate
//! does not perform tracking, filtering, or clutter modeling itself; it supplies the geometry.
//!
//! Primarily built off of [`nalgebra`](https://crates.io/crates/nalgebra), which provides the
//! vector and matrix types. All other functionality (configuration files, CSV batch processing,
//! the `spherconv` command line tool) is auxiliary and built on top of the pure routines in
//! [linearize] and [coordinates].
//!
//! ## Crate overview
//!
//! - [coordinates]: spherical direction vectors and the bistatic spherical/Cartesian conversions.
//! - [linearize]: analytic Jacobians of the spherical measurement with respect to Cartesian position.
//! - [config]: geometry configuration files (TOML/JSON/YAML).
//! - [batch]: CSV import/export for processing many measurements against one geometry.
//! - [error]: validation errors raised when raw inputs are turned into typed geometry.
//!
//! ## Geometry and frames
//!
//! A measurement geometry consists of a transmitter location $l_{tx}$, a receiver location
//! $l_{rx}$ (both in global Cartesian coordinates) and a rotation matrix $M$ that takes the
//! alignment of the global frame into the local frame of the receiver. A point $p$ expressed in
//! global coordinates has local coordinates
//!
//! $$
//! q = M \left( p - l_{rx} \right)
//! $$
//!
//! and conversely $p = M^T q + l_{rx}$. The z-axis of the local frame is normally the pointing
//! direction of the receiver.
//!
//! The range is the bistatic path length $\lVert p - l_{tx} \rVert + \lVert p - l_{rx} \rVert$. When
//! the half-range convention is in use (the usual monostatic convention) the reported range is
//! half of that, i.e. a one-way range.
//!
//! ## Angle conventions
//!
//! Two conventions are supported, selected by [`SystemType`]:
//!
//! - [`SystemType::XyPlaneAzimuth`] (code 0): azimuth measured counterclockwise from the local
//!   x-axis in the x-y plane, elevation measured up from the x-y plane towards the z-axis.
//!   This matches the longitude / geocentric latitude convention.
//! - [`SystemType::ZxPlaneAzimuth`] (code 1): azimuth measured counterclockwise from the local
//!   z-axis in the z-x plane, elevation measured up from the z-x plane towards the y-axis.
//!   This is common when the z-axis is the radar boresight.
//!
//! ## Example
//!
//! ```rust
//! use spherconv::{Geometry, SphericalMeasurement};
//! use spherconv::linearize::spher_conv_jacobian;
//!
//! // Monostatic radar at the origin, one-way range of 1 km straight down the x-axis
//! let geometry = Geometry::default();
//! let z = SphericalMeasurement::new(1000.0, 0.0, 0.0);
//! let j = spher_conv_jacobian(&z, &geometry);
//! assert!((j[(0, 0)] - 1.0).abs() < 1e-12);
//! ```
pub mod batch;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod linearize;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use std::fmt::{self, Display};

pub use crate::error::{GeometryError, GeometryResult};

/// Selects the pair of local axes that define the azimuth plane and the axis elevation is
/// measured towards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemType {
    /// Azimuth from the x-axis in the x-y plane, elevation towards z
    #[default]
    XyPlaneAzimuth = 0,
    /// Azimuth from the z-axis in the z-x plane, elevation towards y
    ZxPlaneAzimuth = 1,
}
impl TryFrom<i64> for SystemType {
    type Error = GeometryError;
    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SystemType::XyPlaneAzimuth),
            1 => Ok(SystemType::ZxPlaneAzimuth),
            other => Err(GeometryError::InvalidSystemType(other)),
        }
    }
}
impl From<SystemType> for i64 {
    fn from(system_type: SystemType) -> Self {
        system_type as i64
    }
}
impl Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemType::XyPlaneAzimuth => write!(f, "x-y plane azimuth (0)"),
            SystemType::ZxPlaneAzimuth => write!(f, "z-x plane azimuth (1)"),
        }
    }
}

/// A spherical measurement in the local receiver frame. Angles are in radians.
///
/// The range follows the convention of the [`Geometry`] it is paired with: one-way when
/// `use_half_range` is set, full bistatic path length otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SphericalMeasurement {
    /// Range in meters
    pub range: f64,
    /// Azimuth in radians
    pub azimuth: f64,
    /// Elevation in radians
    pub elevation: f64,
}
impl SphericalMeasurement {
    pub fn new(range: f64, azimuth: f64, elevation: f64) -> Self {
        SphericalMeasurement {
            range,
            azimuth,
            elevation,
        }
    }
}
impl Display for SphericalMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SphericalMeasurement {{ range: {:.4}, azimuth: {:.6}, elevation: {:.6} }}",
            self.range, self.azimuth, self.elevation
        )
    }
}
impl From<Vector3<f64>> for SphericalMeasurement {
    /// Interprets the vector as `[range, azimuth, elevation]`.
    fn from(v: Vector3<f64>) -> Self {
        SphericalMeasurement::new(v[0], v[1], v[2])
    }
}
impl From<SphericalMeasurement> for Vector3<f64> {
    fn from(z: SphericalMeasurement) -> Self {
        Vector3::new(z.range, z.azimuth, z.elevation)
    }
}
impl TryFrom<&[f64]> for SphericalMeasurement {
    type Error = GeometryError;
    /// Builds a measurement from a `[range, azimuth, elevation]` slice.
    fn try_from(slice: &[f64]) -> Result<Self, Self::Error> {
        let values = sized_slice(slice, 3, "spherical point")?;
        Ok(SphericalMeasurement::new(values[0], values[1], values[2]))
    }
}

/// Full transmitter/receiver configuration needed to evaluate a converted-measurement Jacobian.
///
/// `rotation` maps displacements from the global frame into the local receiver frame,
/// `q = rotation * (p - receiver)`. It is assumed to be orthonormal; this is not checked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Angle convention
    pub system_type: SystemType,
    /// Whether the range is reported as half the bistatic path length
    pub use_half_range: bool,
    /// Transmitter location in global Cartesian coordinates
    pub transmitter: Vector3<f64>,
    /// Receiver location in global Cartesian coordinates
    pub receiver: Vector3<f64>,
    /// Global-to-local rotation of the receiver
    pub rotation: Matrix3<f64>,
}
impl Default for Geometry {
    /// Monostatic sensor at the origin, aligned with the global axes, reporting one-way range.
    fn default() -> Self {
        Geometry::monostatic(SystemType::default())
    }
}
impl Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Geometry {{ system: {}, half_range: {}, tx: [{:.3}, {:.3}, {:.3}], rx: [{:.3}, {:.3}, {:.3}] }}",
            self.system_type,
            self.use_half_range,
            self.transmitter[0],
            self.transmitter[1],
            self.transmitter[2],
            self.receiver[0],
            self.receiver[1],
            self.receiver[2]
        )
    }
}
impl Geometry {
    /// Co-located transmitter and receiver at the origin with an identity rotation and one-way
    /// (half) range.
    pub fn monostatic(system_type: SystemType) -> Self {
        Geometry {
            system_type,
            use_half_range: true,
            transmitter: Vector3::zeros(),
            receiver: Vector3::zeros(),
            rotation: Matrix3::identity(),
        }
    }
    /// General bistatic configuration reporting the full path length.
    pub fn bistatic(
        transmitter: Vector3<f64>,
        receiver: Vector3<f64>,
        rotation: Matrix3<f64>,
        system_type: SystemType,
    ) -> Self {
        Geometry {
            system_type,
            use_half_range: false,
            transmitter,
            receiver,
            rotation,
        }
    }
    /// Returns a copy using the given range convention.
    pub fn with_half_range(mut self, use_half_range: bool) -> Self {
        self.use_half_range = use_half_range;
        self
    }
    /// Assemble a geometry from raw, optional host inputs, applying the documented defaults.
    ///
    /// - `system_type` defaults to 0 and must be 0 or 1.
    /// - `use_half_range` defaults to `true` when both sites are omitted (monostatic) and
    ///   `false` when either is given.
    /// - `transmitter` and `receiver` default to the origin and must have 3 elements.
    /// - `rotation` defaults to the identity and must have 9 elements, read column by column.
    ///
    /// All supplied arrays must be finite.
    ///
    /// # Example
    /// ```rust
    /// use spherconv::{Geometry, SystemType};
    ///
    /// let tx = [0.0, 0.0, 0.0];
    /// let rx = [1e3, 0.0, 0.0];
    /// let g = Geometry::from_parts(Some(1), None, Some(tx.as_slice()), Some(rx.as_slice()), None)
    ///     .unwrap();
    /// assert_eq!(g.system_type, SystemType::ZxPlaneAzimuth);
    /// assert!(!g.use_half_range);
    /// assert!(Geometry::from_parts(Some(2), None, None, None, None).is_err());
    /// ```
    pub fn from_parts(
        system_type: Option<i64>,
        use_half_range: Option<bool>,
        transmitter: Option<&[f64]>,
        receiver: Option<&[f64]>,
        rotation: Option<&[f64]>,
    ) -> GeometryResult<Self> {
        let system_type = match system_type {
            Some(code) => SystemType::try_from(code)?,
            None => SystemType::default(),
        };
        let use_half_range =
            use_half_range.unwrap_or(transmitter.is_none() && receiver.is_none());
        let transmitter = match transmitter {
            Some(values) => {
                Vector3::from_column_slice(checked_slice(values, 3, "transmitter location")?)
            }
            None => Vector3::zeros(),
        };
        let receiver = match receiver {
            Some(values) => {
                Vector3::from_column_slice(checked_slice(values, 3, "receiver location")?)
            }
            None => Vector3::zeros(),
        };
        let rotation = match rotation {
            Some(values) => {
                Matrix3::from_column_slice(checked_slice(values, 9, "rotation matrix")?)
            }
            None => Matrix3::identity(),
        };
        Ok(Geometry {
            system_type,
            use_half_range,
            transmitter,
            receiver,
            rotation,
        })
    }
    /// True when the transmitter and receiver are co-located.
    pub fn is_monostatic(&self) -> bool {
        self.transmitter == self.receiver
    }
    /// Transmitter-to-receiver baseline expressed in the local receiver frame, $M (l_{rx} - l_{tx})$.
    pub fn local_baseline(&self) -> Vector3<f64> {
        self.rotation * (self.receiver - self.transmitter)
    }
    /// Scale from the full bistatic path length to the reported range (0.5 or 1.0).
    pub fn range_scale(&self) -> f64 {
        if self.use_half_range { 0.5 } else { 1.0 }
    }
    /// Converts a reported range to the full bistatic path length.
    pub fn full_range(&self, range: f64) -> f64 {
        range / self.range_scale()
    }
}

fn sized_slice<'a>(
    values: &'a [f64],
    expected: usize,
    what: &'static str,
) -> GeometryResult<&'a [f64]> {
    if values.len() != expected {
        return Err(GeometryError::Dimension {
            what,
            expected,
            found: values.len(),
        });
    }
    Ok(values)
}

fn checked_slice<'a>(
    values: &'a [f64],
    expected: usize,
    what: &'static str,
) -> GeometryResult<&'a [f64]> {
    let values = sized_slice(values, expected, what)?;
    if values.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::NonFinite { what });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn system_type_codes() {
        assert_eq!(SystemType::try_from(0).unwrap(), SystemType::XyPlaneAzimuth);
        assert_eq!(SystemType::try_from(1).unwrap(), SystemType::ZxPlaneAzimuth);
        assert_eq!(
            SystemType::try_from(-1),
            Err(GeometryError::InvalidSystemType(-1))
        );
        assert_eq!(i64::from(SystemType::ZxPlaneAzimuth), 1);
    }
    #[test]
    fn default_geometry_is_monostatic_half_range() {
        let g = Geometry::default();
        assert!(g.is_monostatic());
        assert!(g.use_half_range);
        assert_eq!(g.system_type, SystemType::XyPlaneAzimuth);
        assert_eq!(g.rotation, Matrix3::identity());
        assert_approx_eq!(g.full_range(500.0), 1000.0);
    }
    #[test]
    fn from_parts_defaults() {
        let g = Geometry::from_parts(None, None, None, None, None).unwrap();
        assert_eq!(g, Geometry::default());
        // Supplying either site switches the default to the full bistatic range
        let g = Geometry::from_parts(None, None, None, Some([1.0, 2.0, 3.0].as_slice()), None)
            .unwrap();
        assert!(!g.use_half_range);
        assert_eq!(g.receiver, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(g.transmitter, Vector3::zeros());
        // An explicit flag always wins
        let g = Geometry::from_parts(None, Some(true), Some([1.0, 0.0, 0.0].as_slice()), None, None)
            .unwrap();
        assert!(g.use_half_range);
    }
    #[test]
    fn from_parts_reads_rotation_by_column() {
        let m = [0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let g = Geometry::from_parts(None, None, None, None, Some(m.as_slice())).unwrap();
        assert_eq!(g.rotation[(1, 0)], 1.0);
        assert_eq!(g.rotation[(0, 1)], -1.0);
        assert_eq!(g.rotation[(2, 2)], 1.0);
    }
    #[test]
    fn from_parts_rejects_malformed_inputs() {
        assert_eq!(
            Geometry::from_parts(Some(3), None, None, None, None),
            Err(GeometryError::InvalidSystemType(3))
        );
        assert_eq!(
            Geometry::from_parts(None, None, Some([0.0, 0.0].as_slice()), None, None),
            Err(GeometryError::Dimension {
                what: "transmitter location",
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            Geometry::from_parts(None, None, None, Some([0.0; 4].as_slice()), None),
            Err(GeometryError::Dimension {
                what: "receiver location",
                expected: 3,
                found: 4
            })
        );
        assert_eq!(
            Geometry::from_parts(None, None, None, None, Some([1.0; 6].as_slice())),
            Err(GeometryError::Dimension {
                what: "rotation matrix",
                expected: 9,
                found: 6
            })
        );
        assert_eq!(
            Geometry::from_parts(None, None, Some([0.0, f64::NAN, 0.0].as_slice()), None, None),
            Err(GeometryError::NonFinite {
                what: "transmitter location"
            })
        );
    }
    #[test]
    fn spherical_measurement_conversions() {
        let z = SphericalMeasurement::try_from([100.0, 0.1, -0.2].as_slice()).unwrap();
        assert_eq!(z, SphericalMeasurement::new(100.0, 0.1, -0.2));
        let v: Vector3<f64> = z.into();
        assert_eq!(SphericalMeasurement::from(v), z);
        assert!(SphericalMeasurement::try_from([1.0, 2.0].as_slice()).is_err());
    }
    #[test]
    fn spherical_measurement_passes_non_finite_values() {
        let z = SphericalMeasurement::try_from([f64::NAN, 0.0, f64::INFINITY].as_slice()).unwrap();
        assert!(z.range.is_nan());
        assert!(z.elevation.is_infinite());
        let jacobian = crate::linearize::spher_conv_jacobian(&z, &Geometry::default());
        assert!(jacobian.iter().any(|v| !v.is_finite()));
    }
    #[test]
    fn local_baseline_is_rotated() {
        let rotation = Matrix3::new(0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let g = Geometry::bistatic(
            Vector3::zeros(),
            Vector3::new(10.0, 0.0, 0.0),
            rotation,
            SystemType::XyPlaneAzimuth,
        );
        let b = g.local_baseline();
        assert_approx_eq!(b[0], 0.0);
        assert_approx_eq!(b[1], -10.0);
        assert_approx_eq!(b[2], 0.0);
        assert_approx_eq!(g.range_scale(), 1.0);
    }
    #[test]
    fn display_strings() {
        let s = format!("{}", Geometry::default());
        assert!(s.contains("x-y plane azimuth"));
        let s = format!("{}", SphericalMeasurement::new(1.0, 2.0, 3.0));
        assert!(s.contains("1.0000"));
    }
}
