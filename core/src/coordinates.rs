//! Spherical/Cartesian conversions for monostatic and bistatic sensors
//!
//! These are the companion routines of the converted-measurement Jacobian in [crate::linearize].
//! [cart_to_spher] is the measurement model, mapping a global Cartesian target position to the
//! range, azimuth and elevation the receiver reports. [spher_to_cart] inverts it in closed form.
//!
//! # Bistatic range inversion
//!
//! Let $u$ be the unit direction of the measurement in the local receiver frame, $r$ the full
//! bistatic path length and $b = M (l_{rx} - l_{tx})$ the transmitter-to-receiver baseline in
//! the local frame. The target sits at $d u$ in the local frame, where $d$ is the
//! receiver-to-target distance, and its distance to the transmitter is $\lVert d u + b \rVert$.
//! The range equation
//!
//! $$
//! d + \lVert d u + b \rVert = r
//! $$
//!
//! becomes linear in $d$ after isolating the norm and squaring, since $u^T u = 1$:
//!
//! $$
//! d = \frac{r^2 - \lVert b \rVert^2}{2 \left( r + u^T b \right)}
//! $$
//!
//! There is a single root, so no branch selection is needed. For a monostatic sensor ($b = 0$)
//! this reduces to $d = r / 2$. The denominator vanishes only when the target lies on the
//! extension of the baseline behind the receiver with $r = \lVert b \rVert$, where the ellipse
//! degenerates to a line segment; the division then produces non-finite values.
use crate::{Geometry, SphericalMeasurement, SystemType};
use nalgebra::Vector3;

/// Unit direction vector in the local receiver frame for the given angles (radians).
///
/// # Example
/// ```rust
/// use spherconv::SystemType;
/// use spherconv::coordinates::spher_direction;
///
/// let u = spher_direction(0.0, 0.0, SystemType::ZxPlaneAzimuth);
/// assert_eq!(u, nalgebra::Vector3::new(0.0, 0.0, 1.0));
/// ```
pub fn spher_direction(azimuth: f64, elevation: f64, system_type: SystemType) -> Vector3<f64> {
    let (sin_az, cos_az) = azimuth.sin_cos();
    let (sin_el, cos_el) = elevation.sin_cos();
    match system_type {
        SystemType::XyPlaneAzimuth => Vector3::new(cos_el * cos_az, cos_el * sin_az, sin_el),
        SystemType::ZxPlaneAzimuth => Vector3::new(cos_el * sin_az, sin_el, cos_el * cos_az),
    }
}

/// Azimuth and elevation (radians) of a point given in the local receiver frame.
pub fn local_angles(local: &Vector3<f64>, system_type: SystemType) -> (f64, f64) {
    let (x, y, z) = (local[0], local[1], local[2]);
    match system_type {
        SystemType::XyPlaneAzimuth => (y.atan2(x), z.atan2(x.hypot(y))),
        SystemType::ZxPlaneAzimuth => (x.atan2(z), y.atan2(z.hypot(x))),
    }
}

/// Receiver-to-target distance implied by a spherical measurement.
///
/// Solves $d + \lVert d u + b \rVert = r$ in closed form (see the module documentation). For a
/// monostatic geometry this is the one-way range.
pub fn bistatic_receiver_distance(measurement: &SphericalMeasurement, geometry: &Geometry) -> f64 {
    let full_range = geometry.full_range(measurement.range);
    let direction = spher_direction(
        measurement.azimuth,
        measurement.elevation,
        geometry.system_type,
    );
    let baseline = geometry.local_baseline();
    (full_range * full_range - baseline.norm_squared())
        / (2.0 * (full_range + direction.dot(&baseline)))
}

/// Convert a spherical measurement into a global Cartesian target position.
///
/// # Example
/// ```rust
/// use spherconv::{Geometry, SphericalMeasurement};
/// use spherconv::coordinates::spher_to_cart;
///
/// let p = spher_to_cart(&SphericalMeasurement::new(1000.0, 0.0, 0.0), &Geometry::default());
/// assert!((p[0] - 1000.0).abs() < 1e-9);
/// ```
pub fn spher_to_cart(measurement: &SphericalMeasurement, geometry: &Geometry) -> Vector3<f64> {
    let distance = bistatic_receiver_distance(measurement, geometry);
    let direction = spher_direction(
        measurement.azimuth,
        measurement.elevation,
        geometry.system_type,
    );
    geometry.rotation.transpose() * (distance * direction) + geometry.receiver
}

/// Measurement model: range (halved if the geometry uses half range), azimuth and elevation of
/// a global Cartesian point.
pub fn cart_to_spher(point: &Vector3<f64>, geometry: &Geometry) -> SphericalMeasurement {
    let path_length = (point - geometry.transmitter).norm() + (point - geometry.receiver).norm();
    let local = geometry.rotation * (point - geometry.receiver);
    let (azimuth, elevation) = local_angles(&local, geometry.system_type);
    SphericalMeasurement::new(geometry.range_scale() * path_length, azimuth, elevation)
}
