//! User settings and preferences for phantom-card
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use crate::export::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Application settings persisted to `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────
    /// Brand prefix used in generated file names
    pub brand: String,

    /// Directory exports are written to (defaults to the download directory)
    pub export_dir: Option<PathBuf>,

    /// Format used when none is given on the command line
    pub default_format: ExportFormat,

    /// Quality for JPG exports (0.0 - 1.0)
    pub jpg_quality: f32,

    /// Upper bound for loading a single image during capture
    pub image_timeout_ms: u64,

    /// Whether to open the exported file after export
    pub open_after_export: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Themes
    // ─────────────────────────────────────────────────────────────────────────
    /// Optional theme catalog file replacing the built-in themes
    pub theme_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brand: "phantom-thief".to_string(),
            export_dir: None,
            default_format: ExportFormat::Png,
            jpg_quality: 0.95,
            image_timeout_ms: 15_000,
            open_after_export: false,
            theme_file: None,
        }
    }
}

impl Settings {
    /// Minimum image load timeout.
    pub const MIN_IMAGE_TIMEOUT_MS: u64 = 100;
    /// Maximum image load timeout.
    pub const MAX_IMAGE_TIMEOUT_MS: u64 = 120_000;

    /// Clamp values loaded from disk into valid ranges.
    pub fn sanitize(&mut self) {
        self.jpg_quality = if self.jpg_quality.is_finite() {
            self.jpg_quality.clamp(0.0, 1.0)
        } else {
            Settings::default().jpg_quality
        };

        self.image_timeout_ms = self
            .image_timeout_ms
            .clamp(Self::MIN_IMAGE_TIMEOUT_MS, Self::MAX_IMAGE_TIMEOUT_MS);

        let brand: String = self
            .brand
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '-' })
            .collect();
        self.brand = if brand.is_empty() {
            Settings::default().brand
        } else {
            brand
        };
    }

    /// Resolve where exports go: configured directory, then the user's
    /// download directory, then the current directory.
    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Parse from JSON and sanitize.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.brand, "phantom-thief");
        assert_eq!(settings.default_format, ExportFormat::Png);
        assert_eq!(settings.image_timeout_ms, 15_000);
        assert!(!settings.open_after_export);
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let original = Settings {
            export_dir: Some(PathBuf::from("/tmp/exports")),
            default_format: ExportFormat::Pdf,
            ..Settings::default()
        };
        let json = serde_json::to_string_pretty(&original).unwrap();
        let deserialized: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let json = r#"{"default_format": "jpg"}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.default_format, ExportFormat::Jpg);
        assert_eq!(settings.jpg_quality, 0.95);
    }

    #[test]
    fn test_settings_deserialize_empty_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_sanitize_quality_and_timeout() {
        let mut settings = Settings {
            jpg_quality: 3.0,
            image_timeout_ms: 1,
            ..Settings::default()
        };
        settings.sanitize();
        assert_eq!(settings.jpg_quality, 1.0);
        assert_eq!(settings.image_timeout_ms, Settings::MIN_IMAGE_TIMEOUT_MS);
    }

    #[test]
    fn test_sanitize_brand() {
        let mut settings = Settings {
            brand: " My Brand! ".to_string(),
            ..Settings::default()
        };
        settings.sanitize();
        assert_eq!(settings.brand, "my-brand-");

        settings.brand = "   ".to_string();
        settings.sanitize();
        assert_eq!(settings.brand, "phantom-thief");
    }

    #[test]
    fn test_from_json_sanitized() {
        let json = r#"{"jpg_quality": -1.0, "image_timeout_ms": 999999}"#;
        let settings = Settings::from_json_sanitized(json).unwrap();
        assert_eq!(settings.jpg_quality, 0.0);
        assert_eq!(settings.image_timeout_ms, Settings::MAX_IMAGE_TIMEOUT_MS);
    }

    #[test]
    fn test_resolved_export_dir_prefers_configured() {
        let settings = Settings {
            export_dir: Some(PathBuf::from("/srv/out")),
            ..Settings::default()
        };
        assert_eq!(settings.resolved_export_dir(), PathBuf::from("/srv/out"));
    }
}
