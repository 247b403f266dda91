//! Geometry configuration files
//!
//! A [`GeometryConfig`] is the serializable form of a [`Geometry`]. Every field is optional and
//! falls back to the same defaults as [`Geometry::from_parts`], so a file that only names a
//! receiver location is a valid bistatic configuration and an empty file is the monostatic
//! default. Files are read and written as JSON, YAML or TOML, chosen by extension.
//!
//! ```toml
//! system_type = 1
//! use_half_range = false
//! transmitter = [-2000.0, 0.0, 0.0]
//! receiver = [0.0, 0.0, 10.0]
//! # column-major, global-to-local
//! rotation = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
//! ```
use crate::{Geometry, GeometryResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Text encodings a configuration can be stored in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Format named by the extension of `path` (`json`, `yaml`, `yml` or `toml`, any case).
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported configuration file {}", path.display()),
            )),
        }
    }
}

/// Serializable geometry description
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Angle convention code, 0 (x-y plane azimuth) or 1 (z-x plane azimuth)
    #[serde(default)]
    pub system_type: i64,
    /// Half-range convention; when omitted it is inferred from whether any site is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_half_range: Option<bool>,
    /// Transmitter location `[x, y, z]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmitter: Option<Vec<f64>>,
    /// Receiver location `[x, y, z]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Vec<f64>>,
    /// Global-to-local rotation matrix, 9 values in column-major order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec<f64>>,
}

impl GeometryConfig {
    /// Validate the configuration and build the corresponding [`Geometry`].
    pub fn geometry(&self) -> GeometryResult<Geometry> {
        Geometry::from_parts(
            Some(self.system_type),
            self.use_half_range,
            self.transmitter.as_deref(),
            self.receiver.as_deref(),
            self.rotation.as_deref(),
        )
    }
    /// Encode the configuration as text in the given format.
    pub fn encode(&self, format: ConfigFormat) -> io::Result<String> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(io::Error::other),
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(io::Error::other),
            ConfigFormat::Toml => toml::to_string(self).map_err(io::Error::other),
        }
    }
    /// Decode a configuration written in the given format.
    pub fn decode(text: &str, format: ConfigFormat) -> io::Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(text).map_err(io::Error::other),
            ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(io::Error::other),
            ConfigFormat::Toml => toml::from_str(text).map_err(io::Error::other),
        }
    }
    /// Write the configuration, choosing the format from the file extension.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let text = self.encode(ConfigFormat::from_path(path)?)?;
        fs::write(path, text)
    }
    /// Read a configuration, choosing the format from the file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        Self::decode(&fs::read_to_string(path)?, format)
    }
}

impl From<&Geometry> for GeometryConfig {
    fn from(geometry: &Geometry) -> Self {
        GeometryConfig {
            system_type: geometry.system_type.into(),
            use_half_range: Some(geometry.use_half_range),
            transmitter: Some(geometry.transmitter.iter().copied().collect()),
            receiver: Some(geometry.receiver.iter().copied().collect()),
            // nalgebra iterates in column-major order
            rotation: Some(geometry.rotation.iter().copied().collect()),
        }
    }
}
