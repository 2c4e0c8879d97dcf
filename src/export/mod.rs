//! Export Module for phantom-card
//!
//! This module turns a region of the page into a shareable artifact and
//! delivers it to the user.
//!
//! # Supported Export Formats
//!
//! - **PNG**: Lossless capture, transparent background unless overridden
//! - **JPG**: Lossy capture on an opaque background
//! - **PDF**: The capture placed on a single A4 page with metadata and footer
//! - **Link**: A URL carrying the active theme and a small base64 payload
//!
//! Social media cards are PNG captures resized to a platform's card size.
//!
//! # Architecture
//!
//! - `options.rs` - Formats, per-format defaults and caller options
//! - `progress.rs` - Monotonic progress reporting
//! - `capture.rs` - Target resolution, clone normalization, scoped style overrides
//! - `raster.rs` - Painting the element tree into a bitmap
//! - `encode.rs` - PNG and JPG encoding
//! - `pdf.rs` - PDF composition
//! - `share.rs` - Share link building and parsing
//! - `pipeline.rs` - The [`Exporter`] tying the stages together
//! - `deliver.rs` - File names, writing files, opening them
//! - `clipboard.rs` - Platform clipboard operations

pub mod capture;
pub mod clipboard;
pub mod deliver;
pub mod encode;
pub mod options;
pub mod pdf;
pub mod pipeline;
pub mod progress;
pub mod raster;
pub mod share;

pub use capture::{get_export_element, prepare_element_for_export, validate_export_readiness};
pub use clipboard::{copy_link, copy_text_to_clipboard, CopyOutcome};
pub use deliver::{download_blob, generate_export_filename, open_exported, ExportKind};
pub use options::{
    BackgroundOverride, ExportFormat, ExportOptions, ExportPayload, ExportTarget, SocialPlatform,
};
pub use pipeline::Exporter;
pub use progress::ExportProgress;
pub use share::{build_share_link, parse_share_url, parse_shared_data, ShareData};
