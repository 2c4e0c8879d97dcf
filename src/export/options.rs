//! Export Options and Configuration
//!
//! This module defines the export formats, per-format defaults, the target
//! selection, and the payload handed back to the caller.

use crate::page::{Color, NodePath};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Export Format
// ─────────────────────────────────────────────────────────────────────────────

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless image, transparent background by default
    #[default]
    Png,
    /// Lossy image, always opaque
    Jpg,
    /// Single A4 page with the capture placed as an image
    Pdf,
    /// Shareable URL, no capture
    Link,
}

impl ExportFormat {
    /// Get the display label for this format.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG Image",
            ExportFormat::Jpg => "JPG Image",
            ExportFormat::Pdf => "PDF Document",
            ExportFormat::Link => "Share Link",
        }
    }

    /// Get the file extension for this format (if applicable).
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Png => Some("png"),
            ExportFormat::Jpg => Some("jpg"),
            ExportFormat::Pdf => Some("pdf"),
            ExportFormat::Link => None,
        }
    }

    /// MIME type of the produced bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpg => "image/jpeg",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Link => "text/plain",
        }
    }

    /// Get all available export formats.
    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Png,
            ExportFormat::Jpg,
            ExportFormat::Pdf,
            ExportFormat::Link,
        ]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Link => "link",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "pdf" => Ok(ExportFormat::Pdf),
            "link" | "url" => Ok(ExportFormat::Link),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Target and Background
// ─────────────────────────────────────────────────────────────────────────────

/// Which element to capture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportTarget {
    /// An element the caller already holds
    Node(NodePath),
    /// Look up by id; missing is an error
    Id(String),
    /// Probe the conventional ids in order
    #[default]
    Auto,
}

/// Caller override for the capture background.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BackgroundOverride {
    /// Use the format's default
    #[default]
    Default,
    /// No background; only honored by PNG
    Transparent,
    Color(Color),
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Options
// ─────────────────────────────────────────────────────────────────────────────

/// Caller-supplied options. Unset fields take the format's defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportOptions {
    pub target: ExportTarget,
    pub scale: Option<f32>,
    pub background: BackgroundOverride,
    /// 0.0 - 1.0, used by JPG
    pub quality: Option<f32>,
    /// Suggested file name for delivery
    pub filename: Option<String>,
}

impl ExportOptions {
    /// Capture the element with the given id.
    pub fn for_id(id: &str) -> Self {
        Self {
            target: ExportTarget::Id(id.to_string()),
            ..Default::default()
        }
    }

    /// Capture an element already located in the page.
    pub fn for_node(path: NodePath) -> Self {
        Self {
            target: ExportTarget::Node(path),
            ..Default::default()
        }
    }

    /// Set the capture scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the background override.
    pub fn with_background(mut self, background: BackgroundOverride) -> Self {
        self.background = background;
        self
    }

    /// Set the JPG quality.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Merge with the format's defaults into the values a capture runs with.
    pub fn resolve(&self, format: ExportFormat) -> ResolvedOptions {
        let defaults = ExportDefaults::for_format(format);
        let scale = match self.scale {
            Some(scale) if scale.is_finite() && scale > 0.0 => scale,
            _ => defaults.scale,
        };
        let quality = self
            .quality
            .filter(|q| q.is_finite())
            .unwrap_or(defaults.quality)
            .clamp(0.0, 1.0);

        let background = match (self.background, defaults.background) {
            // JPG and PDF have no alpha channel.
            (BackgroundOverride::Transparent, Some(opaque)) => Some(opaque),
            (BackgroundOverride::Transparent, None) => None,
            (BackgroundOverride::Color(color), Some(opaque)) if !color.is_opaque() => {
                Some(color.over(opaque))
            }
            (BackgroundOverride::Color(color), _) => Some(color),
            (BackgroundOverride::Default, default) => default,
        };

        ResolvedOptions {
            scale,
            background,
            quality,
        }
    }
}

/// Per-format defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportDefaults {
    pub scale: f32,
    /// `None` is transparent
    pub background: Option<Color>,
    pub quality: f32,
}

impl ExportDefaults {
    pub fn for_format(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Png => Self {
                scale: 2.0,
                background: None,
                quality: 1.0,
            },
            ExportFormat::Jpg => Self {
                scale: 2.0,
                background: Some(Color::rgb(0x0a, 0x0a, 0x0a)),
                quality: 0.95,
            },
            ExportFormat::Pdf => Self {
                scale: 1.5,
                background: Some(Color::WHITE),
                quality: 1.0,
            },
            ExportFormat::Link => Self {
                scale: 1.0,
                background: None,
                quality: 1.0,
            },
        }
    }
}

/// Options after merging with defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOptions {
    pub scale: f32,
    pub background: Option<Color>,
    pub quality: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Social Platforms
// ─────────────────────────────────────────────────────────────────────────────

/// Target platform for a social media card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Twitter,
    Linkedin,
    Facebook,
    Instagram,
    #[default]
    General,
}

impl SocialPlatform {
    /// Card size in CSS pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SocialPlatform::Twitter => (1200, 630),
            SocialPlatform::Linkedin => (1200, 627),
            SocialPlatform::Facebook => (1200, 630),
            SocialPlatform::Instagram => (1080, 1080),
            SocialPlatform::General => (1200, 630),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Linkedin => "linkedin",
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::General => "general",
        }
    }

    pub fn all() -> &'static [SocialPlatform] {
        &[
            SocialPlatform::Twitter,
            SocialPlatform::Linkedin,
            SocialPlatform::Facebook,
            SocialPlatform::Instagram,
            SocialPlatform::General,
        ]
    }
}

impl std::str::FromStr for SocialPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SocialPlatform::all()
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown platform: {}", s))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload
// ─────────────────────────────────────────────────────────────────────────────

/// The result of a successful export. Owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPayload {
    Binary { bytes: Vec<u8>, format: ExportFormat },
    Link(String),
}

impl ExportPayload {
    pub fn format(&self) -> ExportFormat {
        match self {
            ExportPayload::Binary { format, .. } => *format,
            ExportPayload::Link(_) => ExportFormat::Link,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            ExportPayload::Binary { bytes, .. } => Some(bytes),
            ExportPayload::Link(_) => None,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            ExportPayload::Link(url) => Some(url),
            ExportPayload::Binary { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
