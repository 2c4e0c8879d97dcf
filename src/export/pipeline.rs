//! The export pipeline
//!
//! [`Exporter`] turns a region of the page into a PNG, JPG, PDF or a share
//! link, reporting progress along the way. One exporter runs one export at
//! a time; a second request while one is running is refused.

use super::capture::{normalize_clone, prepare_element_for_export, resolve_target, StyleGuard};
use super::encode::{encode_jpeg, encode_png};
use super::options::{
    BackgroundOverride, ExportDefaults, ExportFormat, ExportOptions, ExportPayload, SocialPlatform,
};
use super::pdf::{compose_pdf, PdfMetadata};
use super::progress::{ExportProgress, Progress, ProgressReporter};
use super::raster::{InheritedStyle, RasterConfig, Rasterizer};
use super::share::build_share_link;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::page::{Color, Document, NodePath};
use crate::theme::apply::applied_theme_id;
use crate::theme::catalog::DEFAULT_THEME_ID;
use chrono::{Local, Utc};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Clears the in-flight flag however the export ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs exports against a page.
#[derive(Debug)]
pub struct Exporter {
    in_flight: AtomicBool,
    image_timeout: Duration,
    base_dir: Option<PathBuf>,
    fallback_theme: String,
    metadata: PdfMetadata,
}

impl Default for Exporter {
    fn default() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            image_timeout: Duration::from_millis(15_000),
            base_dir: None,
            fallback_theme: DEFAULT_THEME_ID.to_string(),
            metadata: PdfMetadata::default(),
        }
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exporter configured from user settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new().with_image_timeout(Duration::from_millis(settings.image_timeout_ms))
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = timeout;
        self
    }

    /// Directory page-relative `<img>` sources resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Theme id put into share links when the page carries none.
    pub fn with_fallback_theme(mut self, theme_id: &str) -> Self {
        self.fallback_theme = theme_id.to_string();
        self
    }

    pub fn with_metadata(mut self, metadata: PdfMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether an export is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::ExportInProgress);
        }
        Ok(InFlight(&self.in_flight))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────

    /// Export the target region in `format`.
    ///
    /// Progress starts at 0 with `"Initializing export..."`, never goes
    /// down, and ends at 100 on success. Failures end the call without a
    /// payload; the live page is left as it was.
    pub fn export_resume(
        &self,
        document: &mut Document,
        format: ExportFormat,
        options: &ExportOptions,
        mut on_progress: impl FnMut(&ExportProgress),
    ) -> Result<ExportPayload> {
        let _in_flight = self.begin()?;
        let path = resolve_target(document, &options.target)?;
        let mut reporter = ProgressReporter::new(&mut on_progress);
        reporter.report("Initializing export...", 0.0);
        info!("Exporting {} as {}", path, format);

        match format {
            ExportFormat::Png | ExportFormat::Jpg => {
                let bytes = self.capture_image(document, &path, format, options, &mut reporter)?;
                Ok(ExportPayload::Binary { bytes, format })
            }
            ExportFormat::Pdf => {
                let bytes = self.export_pdf(document, &path, options, &mut reporter)?;
                Ok(ExportPayload::Binary { bytes, format })
            }
            ExportFormat::Link => {
                let link = self.share_link(document, &mut reporter);
                Ok(ExportPayload::Link(link))
            }
        }
    }

    /// Capture an element resized to a social platform's card size, as PNG
    /// at scale 2 with a transparent background.
    ///
    /// The element's inline styles are restored on every exit path.
    pub fn export_for_social_media(
        &self,
        document: &mut Document,
        platform: SocialPlatform,
        element_id: &str,
        mut on_progress: impl FnMut(&ExportProgress),
    ) -> Result<Vec<u8>> {
        let _in_flight = self.begin()?;
        let path = document
            .find_by_id(element_id)
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))?;
        let mut reporter = ProgressReporter::new(&mut on_progress);
        reporter.report(&format!("Optimizing for {}...", platform.name()), 10.0);

        let (width, height) = platform.dimensions();
        let inherited = InheritedStyle::for_node(document, &path);
        let live = document
            .node_mut(&path)
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))?;

        let mut prepared = prepare_element_for_export(live, true);
        prepared.set("width", &format!("{}px", width));
        prepared.set("height", &format!("{}px", height));
        prepared.set("min-height", &format!("{}px", height));

        reporter.report("Capturing optimized image...", 30.0);
        let mut clone = (*prepared).clone();
        normalize_clone(&mut clone, ExportFormat::Png);
        let config = self
            .raster_config(2.0, None)
            .with_size(width as f32, height as f32);
        let bitmap = Rasterizer::new(config).render(&clone, &inherited, &mut reporter)?;

        reporter.report("Creating optimized blob...", 80.0);
        let bytes = encode_png(&bitmap)?;
        prepared.restore();

        reporter.report("Social media export complete!", 100.0);
        info!(
            "Social card for {} ({}x{}): {} bytes",
            platform.name(),
            width,
            height,
            bytes.len()
        );
        Ok(bytes)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stages
    // ─────────────────────────────────────────────────────────────────────────

    fn raster_config(&self, scale: f32, background: Option<Color>) -> RasterConfig {
        let mut config = RasterConfig::new()
            .with_scale(scale)
            .with_background(background)
            .with_image_timeout(self.image_timeout);
        if let Some(dir) = &self.base_dir {
            config = config.with_base_dir(dir.clone());
        }
        config
    }

    fn capture_image(
        &self,
        document: &mut Document,
        path: &NodePath,
        format: ExportFormat,
        options: &ExportOptions,
        progress: &mut dyn Progress,
    ) -> Result<Vec<u8>> {
        let resolved = options.resolve(format);
        progress.report("Preparing canvas capture...", 20.0);

        let inherited = InheritedStyle::for_node(document, path);
        let live = document
            .node_mut(path)
            .ok_or_else(|| Error::ElementNotFound(path.to_string()))?;
        let mut live = StyleGuard::new(live);
        live.set("overflow", "visible");

        // Measured on the live element: normalization turns fixed overlays
        // into absolute ones, which would grow the box.
        let (width, height) = live.scroll_size();
        let mut clone = (*live).clone();
        progress.report("Optimizing document clone...", 50.0);
        normalize_clone(&mut clone, format);

        let config = self
            .raster_config(resolved.scale, resolved.background)
            .with_size(width, height);
        let bitmap = Rasterizer::new(config).render(&clone, &inherited, progress)?;

        progress.report(
            &format!("Creating {} blob...", format.to_string().to_uppercase()),
            80.0,
        );
        let bytes = match format {
            ExportFormat::Jpg => {
                let matte = resolved
                    .background
                    .or(ExportDefaults::for_format(ExportFormat::Jpg).background)
                    .unwrap_or(Color::BLACK);
                encode_jpeg(&bitmap, resolved.quality, matte)?
            }
            _ => encode_png(&bitmap)?,
        };
        live.restore();

        progress.report("Export complete!", 100.0);
        Ok(bytes)
    }

    fn export_pdf(
        &self,
        document: &mut Document,
        path: &NodePath,
        options: &ExportOptions,
        reporter: &mut ProgressReporter<'_>,
    ) -> Result<Vec<u8>> {
        reporter.report("Converting to PDF format...", 10.0);

        // The page image is always rendered on white.
        let image_options = ExportOptions {
            scale: Some(options.resolve(ExportFormat::Pdf).scale),
            background: BackgroundOverride::Color(Color::WHITE),
            ..options.clone()
        };
        let png = {
            let mut band = reporter.rescaled(0.0, 0.6, "PDF Step 1/2: ");
            self.capture_image(document, path, ExportFormat::Png, &image_options, &mut band)?
        };

        let bytes = compose_pdf(&png, &self.metadata, Local::now().naive_local(), reporter)?;
        reporter.report("PDF export complete!", 100.0);
        Ok(bytes)
    }

    fn share_link(&self, document: &Document, reporter: &mut ProgressReporter<'_>) -> String {
        reporter.report("Building share data...", 30.0);
        let theme = applied_theme_id(document).unwrap_or(self.fallback_theme.as_str());

        reporter.report("Encoding share parameters...", 60.0);
        let link = build_share_link(&document.url, theme, Utc::now().timestamp_millis());
        debug!("Share link for theme \"{}\": {}", theme, link);

        reporter.report("Share link ready!", 100.0);
        link
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryThemeStorage;
    use crate::export::share::parse_share_url;
    use crate::page::Element;
    use crate::theme::{ThemeEngine, ThemeRegistry};
    use std::cell::RefCell;

    fn page() -> Document {
        let mut doc = Document::new("https://kaito.dev/resume?utm=x");
        let card = Element::new("section")
            .with_id("share-card")
            .with_rect(0.0, 0.0, 120.0, 80.0)
            .with_style("background: var(--theme-primary, #dc143c); height: 80px; overflow: hidden")
            .with_child(
                Element::new("h1")
                    .with_rect(8.0, 8.0, 100.0, 20.0)
                    .with_style("color: #ffffff; animation: pulse 2s infinite")
                    .with_text("Phantom Thief"),
            )
            .with_child(
                Element::new("button")
                    .with_class("no-export")
                    .with_rect(0.0, 60.0, 40.0, 20.0)
                    .with_style("background: #00ff00"),
            );
        doc.body_mut().unwrap().children.push(card);
        doc
    }

    fn run(
        exporter: &Exporter,
        doc: &mut Document,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> (Result<ExportPayload>, Vec<ExportProgress>) {
        let mut seen = Vec::new();
        let result = exporter.export_resume(doc, format, options, |p| seen.push(p.clone()));
        (result, seen)
    }

    fn assert_progress_contract(seen: &[ExportProgress]) {
        assert_eq!(seen.first().map(|p| p.stage.as_str()), Some("Initializing export..."));
        assert_eq!(seen.first().map(|p| p.progress), Some(0.0));
        assert!(seen.windows(2).all(|w| w[0].progress <= w[1].progress));
        assert_eq!(seen.last().map(|p| p.progress), Some(100.0));
    }

    #[test]
    fn test_png_export() {
        let mut doc = page();
        let before = doc.clone();
        let (result, seen) = run(&Exporter::new(), &mut doc, ExportFormat::Png, &ExportOptions::default());

        let payload = result.unwrap();
        assert_eq!(payload.format(), ExportFormat::Png);
        let image = image::load_from_memory(payload.bytes().unwrap()).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (240, 160));
        // The ignored button area shows the card background, not green.
        let [r, g, _, _] = image.get_pixel(10, 150).0;
        assert!(r > 150 && g < 100);

        assert_progress_contract(&seen);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_jpg_is_opaque_even_with_transparent_override() {
        let mut doc = page();
        let options = ExportOptions::for_id("share-card")
            .with_scale(1.0)
            .with_background(BackgroundOverride::Transparent);
        let (result, seen) = run(&Exporter::new(), &mut doc, ExportFormat::Jpg, &options);

        let bytes = result.unwrap().bytes().unwrap().to_vec();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert!(!image::load_from_memory(&bytes).unwrap().color().has_alpha());
        assert!(seen.iter().any(|p| p.stage == "Creating JPG blob..."));
    }

    #[test]
    fn test_pdf_export_progress_is_monotonic() {
        let mut doc = page();
        let options = ExportOptions::default().with_background(BackgroundOverride::Transparent);
        let (result, seen) = run(&Exporter::new(), &mut doc, ExportFormat::Pdf, &options);

        let bytes = result.unwrap().bytes().unwrap().to_vec();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_progress_contract(&seen);
        assert!(seen
            .iter()
            .any(|p| p.stage == "PDF Step 1/2: Preparing canvas capture..."
                && (p.progress - 12.0).abs() < 1e-3));
        assert!(seen.iter().any(|p| p.stage == "Finalizing PDF..." && p.progress == 98.0));
    }

    #[test]
    fn test_link_uses_applied_theme() {
        let mut doc = page();
        let mut engine = ThemeEngine::new(
            ThemeRegistry::builtin(),
            Box::new(MemoryThemeStorage::with_value("mech")),
        );
        engine.initialize(&mut doc);

        let (result, seen) = run(&Exporter::new(), &mut doc, ExportFormat::Link, &ExportOptions::default());
        let link = result.unwrap().link().unwrap().to_string();
        assert!(link.starts_with("https://kaito.dev/resume?theme=mech&share="));
        let parsed = parse_share_url(&link, Utc::now().timestamp_millis());
        assert_eq!(parsed.data.unwrap().theme, "mech");

        let values: Vec<f32> = seen.iter().map(|p| p.progress).collect();
        assert_eq!(values, vec![0.0, 30.0, 60.0, 100.0]);
    }

    #[test]
    fn test_link_falls_back_to_default_theme() {
        let mut doc = page();
        let (result, _) = run(&Exporter::new(), &mut doc, ExportFormat::Link, &ExportOptions::default());
        assert!(result.unwrap().link().unwrap().contains("?theme=persona&"));
    }

    #[test]
    fn test_configured_fallback_theme_and_metadata() {
        let exporter = Exporter::new()
            .with_fallback_theme("pirate")
            .with_metadata(PdfMetadata {
                title: "Kaito Kuroba".to_string(),
                ..PdfMetadata::default()
            });

        let mut doc = page();
        let (result, _) = run(&exporter, &mut doc, ExportFormat::Link, &ExportOptions::default());
        assert!(result.unwrap().link().unwrap().contains("?theme=pirate&"));

        let (result, _) = run(&exporter, &mut doc, ExportFormat::Pdf, &ExportOptions::default());
        let pdf = lopdf::Document::load_mem(result.unwrap().bytes().unwrap()).unwrap();
        let info_id = pdf.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = pdf.get_object(info_id).unwrap().as_dict().unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Kaito Kuroba");
    }

    #[test]
    fn test_missing_target_reports_no_progress() {
        let mut doc = Document::new("https://kaito.dev/");
        let (result, seen) = run(&Exporter::new(), &mut doc, ExportFormat::Png, &ExportOptions::default());
        assert!(matches!(result, Err(Error::NoTargetFound)));
        assert!(seen.is_empty());

        let options = ExportOptions::for_id("ghost");
        let (result, _) = run(&Exporter::new(), &mut doc, ExportFormat::Pdf, &options);
        assert_eq!(result.unwrap_err().to_string(), "Element with ID \"ghost\" not found");
    }

    #[test]
    fn test_node_target() {
        let mut doc = page();
        let path = doc.find_by_id("share-card").unwrap();
        let options = ExportOptions::for_node(path).with_scale(1.0);
        let (result, _) = run(&Exporter::new(), &mut doc, ExportFormat::Png, &options);
        let image = image::load_from_memory(result.unwrap().bytes().unwrap()).unwrap();
        assert_eq!((image.width(), image.height()), (120, 80));
    }

    #[test]
    fn test_fixed_overlay_does_not_grow_capture() {
        let mut doc = page();
        let path = doc.find_by_id("share-card").unwrap();
        doc.node_mut(&path).unwrap().children.push(
            Element::new("div")
                .with_rect(100.0, 70.0, 300.0, 300.0)
                .with_style("position: fixed; background: #0000ff"),
        );
        let options = ExportOptions::for_node(path).with_scale(1.0);
        let (result, _) = run(&Exporter::new(), &mut doc, ExportFormat::Png, &options);
        let image = image::load_from_memory(result.unwrap().bytes().unwrap()).unwrap();
        assert_eq!((image.width(), image.height()), (120, 80));
    }

    #[test]
    fn test_concurrent_export_is_refused() {
        let exporter = Exporter::new();
        let mut outer = page();
        let inner_result = RefCell::new(None);

        let result = exporter.export_resume(
            &mut outer,
            ExportFormat::Png,
            &ExportOptions::default(),
            |p| {
                if p.progress == 0.0 {
                    let mut other = page();
                    let nested = exporter.export_resume(
                        &mut other,
                        ExportFormat::Link,
                        &ExportOptions::default(),
                        |_| {},
                    );
                    *inner_result.borrow_mut() = Some(nested);
                }
            },
        );

        assert!(result.is_ok());
        assert!(matches!(
            inner_result.into_inner(),
            Some(Err(Error::ExportInProgress))
        ));
        assert!(!exporter.is_busy());
    }

    #[test]
    fn test_flag_cleared_after_failure() {
        let exporter = Exporter::new();
        let mut empty = Document::new("https://kaito.dev/");
        assert!(exporter
            .export_resume(&mut empty, ExportFormat::Png, &ExportOptions::default(), |_| {})
            .is_err());
        assert!(!exporter.is_busy());

        let mut doc = page();
        assert!(exporter
            .export_resume(&mut doc, ExportFormat::Link, &ExportOptions::default(), |_| {})
            .is_ok());
    }

    #[test]
    fn test_social_export_restores_styles() {
        let mut doc = page();
        let before = doc.clone();
        let mut seen = Vec::new();
        let bytes = Exporter::new()
            .export_for_social_media(&mut doc, SocialPlatform::Linkedin, "share-card", |p| {
                seen.push(p.progress)
            })
            .unwrap();

        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (2400, 1254));
        assert_eq!(seen, vec![10.0, 30.0, 60.0, 80.0, 100.0]);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_social_export_missing_element() {
        let mut doc = page();
        let before = doc.clone();
        let err = Exporter::new()
            .export_for_social_media(&mut doc, SocialPlatform::General, "nope", |_| {})
            .unwrap_err();
        assert!(matches!(err, Error::ElementNotFound(_)));
        assert_eq!(doc, before);
    }
}
