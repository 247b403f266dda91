//! Analytic Jacobians of spherical measurements with respect to Cartesian position
//!
//! This module provides the local linearization used by trackers that convert spherical
//! (range, azimuth, elevation) measurements into Cartesian coordinates but keep the clutter
//! density specified in the measurement coordinate system. The Jacobian maps a small Cartesian
//! perturbation of the target into the corresponding perturbation of the measurement:
//!
//! $$
//! \delta z \approx J \, \delta p, \qquad J = \frac{\partial (r, \alpha, \epsilon)}{\partial (x, y, z)}
//! $$
//!
//! # Layout
//!
//! ```text
//! J = | ∂r/∂x  ∂r/∂y  ∂r/∂z |  (range)
//!     | ∂α/∂x  ∂α/∂y  ∂α/∂z |  (azimuth)
//!     | ∂ε/∂x  ∂ε/∂y  ∂ε/∂z |  (elevation)
//! ```
//!
//! Columns are the global Cartesian axes.
//!
//! # Derivation
//!
//! The range is $c \left( \lVert p - l_{tx} \rVert + \lVert p - l_{rx} \rVert \right)$ with
//! $c = 1/2$ under the half-range convention and $c = 1$ otherwise, so its gradient is the
//! scaled sum of the unit vectors pointing from each site to the target.
//!
//! The angles depend on the local position $q = M (p - l_{rx})$ only. Their derivatives are taken
//! with respect to $q$ and carried to the global frame by the chain rule,
//! $\partial(\alpha, \epsilon) / \partial p = \partial(\alpha, \epsilon) / \partial q \cdot M$.
//!
//! Degenerate geometries (target at a site, target on the pole of the azimuth plane) divide by
//! zero and return non-finite entries. No error is raised.
use crate::coordinates::spher_to_cart;
use crate::{Geometry, SphericalMeasurement, SystemType};
use nalgebra::{Matrix2x3, Matrix3, Vector3};

/// Compute the converted-measurement Jacobian at a spherical measurement
///
/// The measurement is first converted to the global Cartesian target position it describes
/// (solving the bistatic range equation in closed form, see [crate::coordinates]), and the
/// Jacobian of the measurement model is evaluated there.
///
/// # Arguments
///
/// * `measurement` - Range, azimuth and elevation in the local receiver frame. The range follows
///   the convention selected by `geometry.use_half_range`.
/// * `geometry` - Transmitter and receiver locations, receiver rotation, angle convention and
///   range convention
///
/// # Returns
///
/// 3×3 Jacobian; rows are range, azimuth, elevation and columns are x, y, z.
///
/// # Example
///
/// ```rust
/// use spherconv::{Geometry, SphericalMeasurement, SystemType};
/// use spherconv::linearize::spher_conv_jacobian;
/// use nalgebra::{Matrix3, Vector3};
///
/// let geometry = Geometry::bistatic(
///     Vector3::new(-2000.0, 0.0, 0.0),   // transmitter
///     Vector3::new(0.0, 0.0, 0.0),       // receiver
///     Matrix3::identity(),
///     SystemType::XyPlaneAzimuth,
/// );
/// let z = SphericalMeasurement::new(9000.0, 0.3, 0.05);
/// let j = spher_conv_jacobian(&z, &geometry);
/// assert_eq!(j.nrows(), 3);
/// assert!(j.iter().all(|v| v.is_finite()));
/// ```
pub fn spher_conv_jacobian(
    measurement: &SphericalMeasurement,
    geometry: &Geometry,
) -> Matrix3<f64> {
    let point = spher_to_cart(measurement, geometry);
    spher_jacobian(&point, geometry)
}

/// Compute the Jacobian of the spherical measurement model at a global Cartesian point
///
/// # Arguments
///
/// * `point` - Target position in global Cartesian coordinates
/// * `geometry` - Measurement geometry
///
/// # Returns
///
/// 3×3 Jacobian of [crate::coordinates::cart_to_spher] with respect to `point`.
///
/// # Example
///
/// ```rust
/// use spherconv::Geometry;
/// use spherconv::linearize::spher_jacobian;
/// use nalgebra::Vector3;
///
/// let h = spher_jacobian(&Vector3::new(0.0, 500.0, 0.0), &Geometry::default());
/// // Range increases along +y, azimuth decreases along +x
/// assert!((h[(0, 1)] - 1.0).abs() < 1e-12);
/// assert!((h[(1, 0)] + 1.0 / 500.0).abs() < 1e-12);
/// ```
pub fn spher_jacobian(point: &Vector3<f64>, geometry: &Geometry) -> Matrix3<f64> {
    let from_transmitter = point - geometry.transmitter;
    let from_receiver = point - geometry.receiver;

    // ∂r/∂p: sum of the line-of-sight unit vectors from each site
    let range_gradient = geometry.range_scale()
        * (from_transmitter / from_transmitter.norm() + from_receiver / from_receiver.norm());

    // ∂(α, ε)/∂p = ∂(α, ε)/∂q · M
    let local = geometry.rotation * from_receiver;
    let angle_jacobian = local_angle_jacobian(&local, geometry.system_type) * geometry.rotation;

    let mut jacobian = Matrix3::<f64>::zeros();
    jacobian.set_row(0, &range_gradient.transpose());
    jacobian.set_row(1, &angle_jacobian.row(0));
    jacobian.set_row(2, &angle_jacobian.row(1));
    jacobian
}

/// Derivatives of azimuth (row 0) and elevation (row 1) with respect to the local coordinates.
fn local_angle_jacobian(local: &Vector3<f64>, system_type: SystemType) -> Matrix2x3<f64> {
    let (x, y, z) = (local[0], local[1], local[2]);
    match system_type {
        SystemType::XyPlaneAzimuth => {
            // α = atan2(y, x), ε = atan2(z, ρ), ρ = √(x² + y²)
            let rho_squared = x * x + y * y;
            let rho = rho_squared.sqrt();
            let r_squared = rho_squared + z * z;
            Matrix2x3::new(
                -y / rho_squared,
                x / rho_squared,
                0.0,
                -x * z / (r_squared * rho),
                -y * z / (r_squared * rho),
                rho / r_squared,
            )
        }
        SystemType::ZxPlaneAzimuth => {
            // α = atan2(x, z), ε = atan2(y, ρ), ρ = √(z² + x²)
            let rho_squared = z * z + x * x;
            let rho = rho_squared.sqrt();
            let r_squared = rho_squared + y * y;
            Matrix2x3::new(
                z / rho_squared,
                0.0,
                -x / rho_squared,
                -x * y / (r_squared * rho),
                rho / r_squared,
                -z * y / (r_squared * rho),
            )
        }
    }
}
