//! Viewer parameters: geometry, pixel format and playback rate.

use std::ops::RangeInclusive;
use std::path::Path;

use rawview_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Accepted width and height.
pub const DIMENSION_RANGE: RangeInclusive<u32> = 1..=8192;
/// Accepted linesize.
pub const LINESIZE_RANGE: RangeInclusive<u32> = 1..=16384;
/// Accepted playback rate in frames per second.
pub const FPS_RANGE: RangeInclusive<u32> = 1..=120;

/// Errors raised while loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Parameters the viewer decodes with.
///
/// Missing fields in a settings file fall back to the defaults (1920x1080, linesize 1920,
/// I420, 30 fps).
///
/// # Example
/// ```rust
/// use rawview::prelude::*;
///
/// let settings = ViewerSettings::from_json_str(r#"{ "width": 640, "height": 480, "linesize": 640, "format": "NV12" }"#)?;
/// assert_eq!(settings.format, PixelFormat::Nv12);
/// assert_eq!(settings.fps, 30);
/// assert_eq!(settings.geometry()?.height(), 480);
/// # Ok::<(), SettingsError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub width: u32,
    pub height: u32,
    pub linesize: u32,
    pub format: PixelFormat,
    pub fps: u32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            linesize: 1920,
            format: PixelFormat::I420,
            fps: 30,
        }
    }
}

fn check(field: &'static str, value: u32, range: &RangeInclusive<u32>) -> Result<(), SettingsError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl ViewerSettings {
    /// Parse settings from JSON and validate them.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check every field against the viewer's accepted ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check("width", self.width, &DIMENSION_RANGE)?;
        check("height", self.height, &DIMENSION_RANGE)?;
        check("linesize", self.linesize, &LINESIZE_RANGE)?;
        check("fps", self.fps, &FPS_RANGE)?;
        Ok(())
    }

    /// Validated frame geometry.
    pub fn geometry(&self) -> Result<FrameGeometry, SettingsError> {
        self.validate()?;
        Ok(FrameGeometry::new(self.width, self.height, self.linesize)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer() {
        let settings = ViewerSettings::default();
        assert_eq!(settings.width, 1920);
        assert_eq!(settings.height, 1080);
        assert_eq!(settings.linesize, 1920);
        assert_eq!(settings.format, PixelFormat::I420);
        assert_eq!(settings.fps, 30);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_object_uses_defaults() {
        let settings = ViewerSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, ViewerSettings::default());
    }

    #[test]
    fn out_of_range_fields_are_reported() {
        let err = ViewerSettings::from_json_str(r#"{ "fps": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::OutOfRange {
                field: "fps",
                value: 0,
                min: 1,
                max: 120
            }
        ));

        let wide = ViewerSettings {
            width: 8193,
            ..ViewerSettings::default()
        };
        assert!(matches!(
            wide.validate(),
            Err(SettingsError::OutOfRange { field: "width", .. })
        ));
    }

    #[test]
    fn linesize_narrower_than_width_is_invalid_geometry() {
        let settings = ViewerSettings {
            width: 640,
            linesize: 320,
            ..ViewerSettings::default()
        };
        assert!(settings.validate().is_ok());
        assert!(matches!(
            settings.geometry(),
            Err(SettingsError::Format(FormatError::InvalidGeometry(_)))
        ));
    }

    #[test]
    fn format_accepts_labels_and_rejects_unknown_names() {
        let settings =
            ViewerSettings::from_json_str(r#"{ "format": "YUV422P (I422)" }"#).unwrap();
        assert_eq!(settings.format, PixelFormat::I422);
        assert!(matches!(
            ViewerSettings::from_json_str(r#"{ "format": "P010" }"#),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn json_round_trip() {
        let settings = ViewerSettings {
            format: PixelFormat::Rgba8888,
            fps: 60,
            ..ViewerSettings::default()
        };
        let json = settings.to_json_pretty().unwrap();
        assert!(json.contains("\"RGBA8888\""));
        assert_eq!(ViewerSettings::from_json_str(&json).unwrap(), settings);
    }
}
