//! Scanner data models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A scanner device as reported by the scanner-control daemon.
///
/// Consumed read-only by callers; the daemon owns device discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerInfo {
    /// Device identifier used to address scan requests
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Manufacturer, if the driver reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Model, if the driver reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Device kind (e.g. "flatbed", "demo")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ScannerInfo {
    /// Create a scanner entry with only the required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manufacturer: None,
            model: None,
            kind: None,
        }
    }
}

/// Color mode for a scan acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Color,
    Grayscale,
    BlackAndWhite,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColorMode::Color => "color",
            ColorMode::Grayscale => "grayscale",
            ColorMode::BlackAndWhite => "black_and_white",
        };
        f.write_str(s)
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "color" => Ok(ColorMode::Color),
            "grayscale" => Ok(ColorMode::Grayscale),
            "black_and_white" => Ok(ColorMode::BlackAndWhite),
            other => Err(format!(
                "unknown color mode '{other}' (expected color, grayscale or black_and_white)"
            )),
        }
    }
}

/// Default scan resolution in DPI
pub const DEFAULT_RESOLUTION: u32 = 300;

/// Caller-supplied parameters for a scan request.
///
/// Immutable value; serialized into the `data` object of the outbound
/// `scan` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Target scanner device identifier
    pub scanner_id: String,
    /// Resolution in DPI
    #[serde(default = "default_resolution")]
    pub resolution: u32,
    /// Color mode
    #[serde(default)]
    pub color_mode: ColorMode,
}

fn default_resolution() -> u32 {
    DEFAULT_RESOLUTION
}

impl ScanSettings {
    /// Settings for the given scanner with default resolution and color mode
    pub fn new(scanner_id: impl Into<String>) -> Self {
        Self {
            scanner_id: scanner_id.into(),
            resolution: DEFAULT_RESOLUTION,
            color_mode: ColorMode::default(),
        }
    }

    /// Set the resolution in DPI
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the color mode
    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }
}

/// Result of a scan request as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Outcome status ("success" or "error")
    pub status: String,
    /// Human-readable detail, set on failure and sometimes on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Base64-encoded image payload, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    /// Image format of the payload (e.g. "png")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Set when the image is synthetic sample data rather than from hardware
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<bool>,
}

impl ScanOutcome {
    /// Successful outcome carrying a base64 image payload
    pub fn success(image_data: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            image_data: Some(image_data.into()),
            format: Some(format.into()),
            demo: None,
        }
    }

    /// Failed outcome with a display message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            image_data: None,
            format: None,
            demo: None,
        }
    }

    /// Mark the outcome as synthetic demo data
    pub fn with_demo(mut self) -> Self {
        self.demo = Some(true);
        self
    }

    /// Whether the daemon reported the scan as successful
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_mode_round_trips_through_str() {
        for mode in [ColorMode::Color, ColorMode::Grayscale, ColorMode::BlackAndWhite] {
            assert_eq!(mode.to_string().parse::<ColorMode>().unwrap(), mode);
        }
        assert!("sepia".parse::<ColorMode>().is_err());
    }

    #[test]
    fn scan_settings_defaults() {
        let settings = ScanSettings::new("s1");
        assert_eq!(settings.resolution, 300);
        assert_eq!(settings.color_mode, ColorMode::Color);
    }

    #[test]
    fn scan_settings_deserialize_fills_defaults() {
        let settings: ScanSettings = serde_json::from_str(r#"{"scanner_id":"s1"}"#).unwrap();
        assert_eq!(settings.resolution, 300);
        assert_eq!(settings.color_mode, ColorMode::Color);
    }

    #[test]
    fn scanner_info_optional_fields_omitted() {
        let json = serde_json::to_value(ScannerInfo::new("s1", "Front desk")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "s1", "name": "Front desk"})
        );
    }

    #[test]
    fn outcome_status_checks() {
        assert!(ScanOutcome::success("aGk=", "png").is_success());
        assert!(!ScanOutcome::failure("no paper").is_success());
    }
}
