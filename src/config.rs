//! Configuration types.
//!
//! Two kinds of settings exist and they live apart:
//!
//! * [`ServerConfig`]: process-wide, built once at startup via
//!   [`ServerConfigBuilder`] and never mutated afterwards. Handlers read it
//!   through shared axum state.
//! * [`ConversionParams`]: per-request rendering DPI and JPEG quality,
//!   validated against fixed bounds before any rendering happens.

use crate::error::Pdf2JpgError;
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Accepted rendering resolutions, in dots per inch.
pub const DPI_RANGE: RangeInclusive<u32> = 72..=600;
/// Accepted JPEG quality values.
pub const QUALITY_RANGE: RangeInclusive<u32> = 1..=100;

pub const DEFAULT_DPI: u32 = 150;
pub const DEFAULT_QUALITY: u8 = 85;

/// Per-request conversion parameters.
///
/// ```rust
/// use pdf2jpg::ConversionParams;
///
/// let p = ConversionParams::new(300, 90).unwrap();
/// assert_eq!(p.dpi, 300);
/// assert!(ConversionParams::new(50, 90).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionParams {
    /// Rendering resolution. Range: 72–600. Default: 150.
    pub dpi: u32,
    /// JPEG quality. Range: 1–100. Default: 85.
    pub quality: u8,
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ConversionParams {
    /// Validate both values against their bounds.
    pub fn new(dpi: u32, quality: u32) -> Result<Self, Pdf2JpgError> {
        let dpi = check_range("dpi", dpi, &DPI_RANGE)?;
        let quality = check_range("quality", quality, &QUALITY_RANGE)?;
        Ok(Self {
            dpi,
            quality: quality as u8,
        })
    }

    /// Build from raw form-field text. `None` means the field was absent and
    /// takes its default.
    pub fn from_form(dpi: Option<&str>, quality: Option<&str>) -> Result<Self, Pdf2JpgError> {
        let dpi = parse_field("dpi", dpi, DEFAULT_DPI, &DPI_RANGE)?;
        let quality = parse_field("quality", quality, DEFAULT_QUALITY as u32, &QUALITY_RANGE)?;
        Self::new(dpi, quality)
    }
}

fn check_range(
    name: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<u32, Pdf2JpgError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(invalid(name, value.to_string(), range))
    }
}

fn parse_field(
    name: &'static str,
    raw: Option<&str>,
    default: u32,
    range: &RangeInclusive<u32>,
) -> Result<u32, Pdf2JpgError> {
    match raw.map(str::trim) {
        None => Ok(default),
        Some(text) => text
            .parse::<u32>()
            .map_err(|_| invalid(name, text.to_string(), range))
            .and_then(|v| check_range(name, v, range)),
    }
}

fn invalid(name: &'static str, value: String, range: &RangeInclusive<u32>) -> Pdf2JpgError {
    Pdf2JpgError::InvalidParameter {
        name,
        value,
        min: *range.start(),
        max: *range.end(),
    }
}

/// Process-wide settings for the HTTP service.
///
/// ```rust
/// use pdf2jpg::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .port(9000)
///     .static_dir("assets")
///     .build()
///     .unwrap();
/// assert_eq!(config.socket_addr().port(), 9000);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: 0.0.0.0.
    pub host: IpAddr,
    /// TCP port. Default: 8000.
    pub port: u16,
    /// Directory holding `index.html` and the assets served under `/static`.
    /// Default: `static`.
    pub static_dir: PathBuf,
    /// Largest accepted request body, in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            static_dir: PathBuf::from("static"),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the front-end entry page.
    pub fn index_file(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: IpAddr) -> Self {
        self.config.host = host;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.static_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, Pdf2JpgError> {
        if self.config.max_upload_bytes == 0 {
            return Err(Pdf2JpgError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let p = ConversionParams::default();
        assert_eq!((p.dpi, p.quality), (150, 85));

        let c = ServerConfig::default();
        assert_eq!(c.port, 8000);
        assert_eq!(c.index_file(), PathBuf::from("static/index.html"));
        assert_eq!(c.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(ConversionParams::new(72, 1).is_ok());
        assert!(ConversionParams::new(600, 100).is_ok());
        assert!(ConversionParams::new(71, 85).is_err());
        assert!(ConversionParams::new(601, 85).is_err());
        assert!(ConversionParams::new(150, 0).is_err());
        assert!(ConversionParams::new(150, 101).is_err());
    }

    #[test]
    fn form_fields_default_when_absent() {
        assert_eq!(
            ConversionParams::from_form(None, None).unwrap(),
            ConversionParams::default()
        );
        let p = ConversionParams::from_form(Some(" 300 "), None).unwrap();
        assert_eq!((p.dpi, p.quality), (300, 85));
    }

    #[test]
    fn form_fields_reject_non_integers() {
        for raw in ["abc", "", "150.5", "-1"] {
            let err = ConversionParams::from_form(Some(raw), None).unwrap_err();
            assert!(
                matches!(err, Pdf2JpgError::InvalidParameter { name: "dpi", .. }),
                "{raw:?} gave {err:?}"
            );
        }
        let err = ConversionParams::from_form(None, Some("1000")).unwrap_err();
        assert!(matches!(err, Pdf2JpgError::InvalidParameter { name: "quality", .. }));
    }

    #[test]
    fn params_serialize_as_plain_numbers() {
        let json = serde_json::to_value(ConversionParams::new(200, 90).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "dpi": 200, "quality": 90 }));
    }

    #[test]
    fn zero_upload_limit_is_rejected() {
        let err = ServerConfig::builder().max_upload_bytes(0).build().unwrap_err();
        assert!(matches!(err, Pdf2JpgError::InvalidConfig(_)));
    }
}
