//! Validation errors for geometry and measurement inputs.
//!
//! The Jacobian and coordinate routines themselves cannot fail; degenerate geometries
//! surface as non-finite numbers. Everything that can be rejected is rejected here,
//! before any computation, when raw host data (slices, integer codes, config files) is
//! turned into the typed inputs of the crate.

use thiserror::Error;

/// Errors raised while assembling a [`crate::Geometry`] or [`crate::SphericalMeasurement`]
/// from raw inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// System type code other than 0 (x-y plane azimuth) or 1 (z-x plane azimuth)
    #[error("Invalid system type specified: {0}")]
    InvalidSystemType(i64),

    /// Array argument with the wrong number of elements
    #[error("The {what} has the wrong dimensionality: expected {expected} elements, found {found}")]
    Dimension {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Array argument containing NaN or infinite values
    #[error("The {what} must contain only finite real values")]
    NonFinite { what: &'static str },
}

/// Result alias for validation routines
pub type GeometryResult<T> = Result<T, GeometryError>;
