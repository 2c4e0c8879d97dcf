//! Centralized error handling for phantom-card
//!
//! This module provides a unified error type that covers all error scenarios
//! in the crate: export target resolution, capture and encoding, PDF
//! composition, theme registry loading, and configuration persistence.

use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the crate.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Export Input Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// An explicitly requested element does not exist in the page
    ElementNotFound(String),

    /// No element was requested and none of the conventional ids exist
    NoTargetFound,

    /// Another export is still running on the same exporter
    ExportInProgress,

    // ─────────────────────────────────────────────────────────────────────────
    // Capture Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The encoder produced no data for the requested format
    BlobEncodingFailed { format: String },

    /// The encoder itself reported a failure
    ImageEncode(image::ImageError),

    /// A rasterized image could not be decoded again (PDF composition)
    ImageLoad(String),

    /// Building the PDF document failed
    PdfGeneration(String),

    // ─────────────────────────────────────────────────────────────────────────
    // File I/O Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic I/O error wrapper
    Io(io::Error),

    /// Failed to write file contents
    FileWrite { path: PathBuf, source: io::Error },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to load configuration file
    ConfigLoad {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to save configuration file
    ConfigSave {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse configuration (invalid JSON/format)
    ConfigParse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration directory not found or inaccessible
    ConfigDirNotFound,

    /// The theme catalog is structurally invalid
    ThemeRegistry(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Delivery Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Clipboard could not be accessed or written
    Clipboard(String),
}

// Implement From traits for convenient error conversion
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageEncode(err)
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::PdfGeneration(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation for user-friendly error messages
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Export input errors
            Error::ElementNotFound(id) => write!(f, "Element with ID \"{}\" not found", id),
            Error::NoTargetFound => {
                write!(f, "No target element found. Specify elementId or element.")
            }
            Error::ExportInProgress => write!(f, "An export is already in progress"),

            // Capture errors
            Error::BlobEncodingFailed { format } => {
                write!(f, "Failed to create {} blob", format.to_uppercase())
            }
            Error::ImageEncode(err) => write!(f, "Image encoding failed: {}", err),
            Error::ImageLoad(msg) => write!(f, "Failed to load image for PDF: {}", msg),
            Error::PdfGeneration(msg) => write!(f, "PDF generation failed: {}", msg),

            // File I/O errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::FileWrite { path, source } => {
                write!(f, "Failed to write '{}': {}", path.display(), source)
            }

            // Configuration errors
            Error::ConfigLoad { path, source } => {
                write!(
                    f,
                    "Failed to load configuration from '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigSave { path, source } => {
                write!(
                    f,
                    "Failed to save configuration to '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigParse { message, .. } => {
                write!(f, "Invalid configuration format: {}", message)
            }
            Error::ConfigDirNotFound => {
                write!(f, "Configuration directory not found")
            }
            Error::ThemeRegistry(msg) => write!(f, "Invalid theme registry: {}", msg),

            // Delivery errors
            Error::Clipboard(msg) => write!(f, "Clipboard error: {}", msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// std::error::Error trait implementation for error chaining
// ─────────────────────────────────────────────────────────────────────────────
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::ImageEncode(err) => Some(err),
            Error::FileWrite { source, .. } => Some(source),
            Error::ConfigLoad { source, .. } => Some(source.as_ref()),
            Error::ConfigSave { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::ElementNotFound(_)
            | Error::NoTargetFound
            | Error::ExportInProgress
            | Error::BlobEncodingFailed { .. }
            | Error::ImageLoad(_)
            | Error::PdfGeneration(_)
            | Error::ConfigDirNotFound
            | Error::ThemeRegistry(_)
            | Error::Clipboard(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
