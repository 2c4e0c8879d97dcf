//! Rasterizing a page subtree into an RGBA bitmap
//!
//! The painter walks a (normalized) element clone and paints backgrounds,
//! images and text blocks at `scale` device pixels per CSS pixel. Text is
//! drawn as greeked bars: one bar per word, wrapped to the element's width,
//! in the inherited text color.

use super::capture::is_ignored;
use super::progress::Progress;
use crate::error::Result;
use crate::page::color::split_top_level;
use crate::page::{Color, Document, Element, NodePath, Paint};
use base64::Engine;
use image::{imageops, Rgba, RgbaImage};
use log::{debug, warn};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Largest bitmap side, matching common browser canvas limits.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

const DEFAULT_FONT_SIZE: f32 = 16.0;
const MAX_VAR_DEPTH: usize = 8;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Rasterizer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfig {
    /// Device pixels per CSS pixel
    pub scale: f32,
    /// Canvas fill; `None` leaves it transparent
    pub background: Option<Color>,
    /// Upper bound for loading one `<img>` source
    pub image_timeout: Duration,
    /// Directory relative image paths resolve against
    pub base_dir: Option<PathBuf>,
    /// Force the capture size instead of the element's scroll size
    pub size_override: Option<(f32, f32)>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: None,
            image_timeout: Duration::from_millis(15_000),
            base_dir: None,
            size_override: None,
        }
    }
}

impl RasterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = timeout;
        self
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size_override = Some((width, height));
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inherited Context
// ─────────────────────────────────────────────────────────────────────────────

/// Inherited values an element sees from its ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritedStyle {
    pub custom_properties: BTreeMap<String, String>,
    pub color: Color,
    pub font_size: f32,
}

impl Default for InheritedStyle {
    fn default() -> Self {
        Self {
            custom_properties: BTreeMap::new(),
            color: Color::BLACK,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl InheritedStyle {
    /// Collect what the node at `path` inherits, walking from the document
    /// element down to (but not including) the node itself.
    pub fn for_node(document: &Document, path: &NodePath) -> Self {
        let Some((_, ancestors)) = path.0.split_last() else {
            return InheritedStyle::default();
        };
        let mut node = &document.root;
        let mut inherited = InheritedStyle::default().child(node);
        for &index in ancestors {
            match node.children.get(index) {
                Some(child) => {
                    node = child;
                    inherited = inherited.child(node);
                }
                None => break,
            }
        }
        inherited
    }

    /// The context `element`'s children inherit.
    pub fn child(&self, element: &Element) -> Self {
        let mut next = self.clone();
        for (name, value) in element.style.custom_properties() {
            let resolved = resolve_vars(value, &self.custom_properties);
            next.custom_properties.insert(name.to_string(), resolved);
        }
        if let Some(color) = element
            .style
            .get("color")
            .and_then(|v| Color::parse(&next.resolve(v)))
        {
            next.color = color;
        }
        if let Some(size) = element
            .style
            .get("font-size")
            .and_then(|v| crate::page::style::parse_px(&next.resolve(v)))
        {
            next.font_size = size.max(1.0);
        }
        next
    }

    /// Substitute `var(--x)` references in a value.
    pub fn resolve(&self, value: &str) -> String {
        resolve_vars(value, &self.custom_properties)
    }
}

fn var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"var\(\s*(--[A-Za-z0-9_-]+)\s*(?:,\s*([^()]*(?:\([^()]*\))?[^()]*))?\)")
            .unwrap_or_else(|_| unreachable!("static var() regex is valid"))
    })
}

/// Replace `var(--name[, fallback])` with the property value, the fallback,
/// or nothing. Nested references resolve up to a fixed depth.
pub fn resolve_vars(value: &str, properties: &BTreeMap<String, String>) -> String {
    let mut current = value.to_string();
    for _ in 0..MAX_VAR_DEPTH {
        if !current.contains("var(") {
            break;
        }
        let next = var_regex()
            .replace_all(&current, |caps: &regex::Captures| {
                let name = &caps[1];
                properties
                    .get(name)
                    .cloned()
                    .or_else(|| caps.get(2).map(|m| m.as_str().trim().to_string()))
                    .unwrap_or_default()
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Clip rectangle in device pixels, `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Clip {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Clip {
    fn intersect(self, other: Clip) -> Clip {
        Clip {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rasterizer
// ─────────────────────────────────────────────────────────────────────────────

/// Paints element trees into bitmaps.
pub struct Rasterizer {
    config: RasterConfig,
    images: HashMap<String, Option<RgbaImage>>,
}

impl Rasterizer {
    pub fn new(config: RasterConfig) -> Self {
        Self {
            config,
            images: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Paint `element` (its own origin at the bitmap's top-left corner).
    ///
    /// A `filter` declared on the element is applied to the finished bitmap.
    pub fn render(
        &mut self,
        element: &Element,
        inherited: &InheritedStyle,
        progress: &mut dyn Progress,
    ) -> Result<RgbaImage> {
        let (css_width, css_height) = self
            .config
            .size_override
            .unwrap_or_else(|| element.scroll_size());
        let scale = if self.config.scale.is_finite() && self.config.scale > 0.0 {
            self.config.scale
        } else {
            1.0
        };
        let width = device_size(css_width, scale);
        let height = device_size(css_height, scale);
        debug!(
            "Rasterizing <{}> at {}x{} CSS px -> {}x{} px",
            element.tag, css_width, css_height, width, height
        );

        let fill = self.config.background.unwrap_or(Color::TRANSPARENT);
        let mut canvas = RgbaImage::from_pixel(width, height, fill.to_rgba());

        progress.report("Painting elements...", 60.0);
        let clip = Clip {
            x0: 0.0,
            y0: 0.0,
            x1: width as f32,
            y1: height as f32,
        };
        let mut painter = Painter {
            canvas: &mut canvas,
            scale,
            images: &mut self.images,
            config: &self.config,
        };
        painter.paint(element, 0.0, 0.0, clip, inherited, 1.0, true);

        if let Some(filter) = element.style.get("filter") {
            let filter = inherited.resolve(filter);
            apply_filter(&mut canvas, &filter);
        }
        Ok(canvas)
    }
}

fn device_size(css: f32, scale: f32) -> u32 {
    let px = (css.max(1.0) * scale).ceil();
    if px > MAX_CANVAS_SIDE as f32 {
        warn!(
            "Capture side of {} px exceeds {} px, clamping",
            px, MAX_CANVAS_SIDE
        );
        MAX_CANVAS_SIDE
    } else {
        (px as u32).max(1)
    }
}

struct Painter<'a> {
    canvas: &'a mut RgbaImage,
    scale: f32,
    images: &'a mut HashMap<String, Option<RgbaImage>>,
    config: &'a RasterConfig,
}

impl Painter<'_> {
    #[allow(clippy::too_many_arguments)]
    fn paint(
        &mut self,
        element: &Element,
        origin_x: f32,
        origin_y: f32,
        clip: Clip,
        inherited: &InheritedStyle,
        opacity: f32,
        is_root: bool,
    ) {
        if !is_root && is_ignored(element) {
            return;
        }
        let style = inherited.child(element);
        let get = |property: &str| element.style.get(property).map(|v| style.resolve(v));

        if get("display").as_deref() == Some("none") {
            return;
        }
        let visible = get("visibility").as_deref() != Some("hidden");
        let opacity = opacity
            * get("opacity")
                .and_then(|v| v.trim().parse::<f32>().ok())
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }

        let (x, y) = if is_root {
            (0.0, 0.0)
        } else {
            (origin_x + element.rect.x, origin_y + element.rect.y)
        };
        let (w, h) = (element.box_width(), element.box_height());
        let device = Clip {
            x0: x * self.scale,
            y0: y * self.scale,
            x1: (x + w) * self.scale,
            y1: (y + h) * self.scale,
        };

        if visible {
            let background = get("background").or_else(|| get("background-color"));
            if let Some(paint) = background.as_deref().and_then(Paint::parse) {
                self.fill(device, clip, &paint, opacity);
            }
            if element.tag == "img" {
                if let Some(src) = element.attr("src") {
                    self.draw_image(src, device, clip, opacity);
                }
            }
            if let Some(text) = element.text.as_deref() {
                self.draw_text(text, device, clip, &style, opacity);
            }
        }

        let child_clip = match get("overflow").as_deref() {
            Some("hidden") | Some("clip") => clip.intersect(device),
            _ => clip,
        };
        if child_clip.is_empty() {
            return;
        }
        for child in &element.children {
            self.paint(child, x, y, child_clip, &style, opacity, false);
        }
    }

    fn fill(&mut self, area: Clip, clip: Clip, paint: &Paint, opacity: f32) {
        let bounds = area.intersect(clip);
        if bounds.is_empty() {
            return;
        }
        let (w, h) = (area.x1 - area.x0, area.y1 - area.y0);
        for py in bounds.y0.floor() as u32..bounds.y1.ceil() as u32 {
            for px in bounds.x0.floor() as u32..bounds.x1.ceil() as u32 {
                let color = paint
                    .color_at(px as f32 + 0.5 - area.x0, py as f32 + 0.5 - area.y0, w, h)
                    .with_opacity(opacity);
                self.blend(px, py, color);
            }
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Color) {
        blend_pixel(self.canvas, x, y, color);
    }

    /// One bar per word, wrapped at the element's width.
    fn draw_text(
        &mut self,
        text: &str,
        area: Clip,
        clip: Clip,
        style: &InheritedStyle,
        opacity: f32,
    ) {
        let font = style.font_size * self.scale;
        let line_height = font * 1.2;
        let char_width = font * 0.5;
        let bar_height = (font * 0.6).max(1.0);
        let max_x = if area.x1 > area.x0 { area.x1 } else { f32::MAX };
        let paint = Paint::Solid(style.color.with_opacity(opacity));
        let clip = clip.intersect(self.full());

        let mut cursor_x = area.x0;
        let mut cursor_y = area.y0;
        for word in text.split_whitespace() {
            let word_width = word.chars().count() as f32 * char_width;
            if cursor_x > area.x0 && cursor_x + word_width > max_x {
                cursor_x = area.x0;
                cursor_y += line_height;
            }
            let top = cursor_y + (line_height - bar_height) / 2.0;
            let bar = Clip {
                x0: cursor_x,
                y0: top,
                x1: cursor_x + word_width,
                y1: top + bar_height,
            };
            self.fill(bar, clip, &paint, 1.0);
            cursor_x += word_width + char_width;
        }
    }

    fn full(&self) -> Clip {
        Clip {
            x0: 0.0,
            y0: 0.0,
            x1: self.canvas.width() as f32,
            y1: self.canvas.height() as f32,
        }
    }

    /// Sample the source per visible device pixel, so work and memory stay
    /// bounded by the canvas however large the `<img>` box is.
    fn draw_image(&mut self, src: &str, area: Clip, clip: Clip, opacity: f32) {
        let (area_width, area_height) = (area.x1 - area.x0, area.y1 - area.y0);
        if area_width < 0.5 || area_height < 0.5 {
            return;
        }
        let bounds = area.intersect(clip).intersect(self.full());
        if bounds.is_empty() {
            return;
        }

        let config = self.config;
        let source = self
            .images
            .entry(src.to_string())
            .or_insert_with(|| load_image(src, config.base_dir.as_deref(), config.image_timeout));
        let Some(source) = source.as_ref() else {
            return;
        };

        for py in bounds.y0.floor() as u32..bounds.y1.ceil() as u32 {
            let v = ((py as f32 + 0.5 - area.y0) / area_height).clamp(0.0, 1.0);
            for px in bounds.x0.floor() as u32..bounds.x1.ceil() as u32 {
                let u = ((px as f32 + 0.5 - area.x0) / area_width).clamp(0.0, 1.0);
                let Some(Rgba([r, g, b, a])) = imageops::sample_bilinear(source, u, v) else {
                    continue;
                };
                blend_pixel(
                    self.canvas,
                    px,
                    py,
                    Color::rgba(r, g, b, a).with_opacity(opacity),
                );
            }
        }
    }
}

fn blend_pixel(canvas: &mut RgbaImage, x: u32, y: u32, color: Color) {
    if x >= canvas.width() || y >= canvas.height() || color.a == 0 {
        return;
    }
    let Rgba([r, g, b, a]) = *canvas.get_pixel(x, y);
    let out = color.over(Color::rgba(r, g, b, a));
    canvas.put_pixel(x, y, out.to_rgba());
}

// ─────────────────────────────────────────────────────────────────────────────
// Image Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Load an `<img>` source on a worker thread, giving up after `timeout`.
///
/// Supports `data:image/...;base64,` URIs and local paths (absolute, or
/// relative to `base_dir`). Remote URLs are skipped. Failures are logged and
/// the image is left out of the capture.
pub fn load_image(src: &str, base_dir: Option<&Path>, timeout: Duration) -> Option<RgbaImage> {
    if src.starts_with("http://") || src.starts_with("https://") {
        warn!("Skipping remote image {}", src);
        return None;
    }

    let source = src.to_string();
    let path = resolve_image_path(src, base_dir);
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = match source.strip_prefix("data:") {
            Some(data_uri) => decode_data_uri(data_uri),
            None => image::open(&path)
                .map(|img| img.to_rgba8())
                .map_err(|e| e.to_string()),
        };
        // The receiver may have given up already.
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(image)) => Some(image),
        Ok(Err(e)) => {
            warn!("Failed to load image {}: {}", truncate(src), e);
            None
        }
        Err(_) => {
            warn!(
                "Image {} did not load within {} ms",
                truncate(src),
                timeout.as_millis()
            );
            None
        }
    }
}

/// `file://` URIs are taken as-is; any other path is site-relative and
/// resolves under `base_dir` when one is set.
fn resolve_image_path(src: &str, base_dir: Option<&Path>) -> PathBuf {
    if let Some(path) = src.strip_prefix("file://") {
        return PathBuf::from(path);
    }
    match base_dir {
        Some(base) => base.join(src.trim_start_matches('/')),
        None => PathBuf::from(src),
    }
}

fn decode_data_uri(data_uri: &str) -> std::result::Result<RgbaImage, String> {
    let (_, payload) = data_uri
        .split_once(";base64,")
        .ok_or_else(|| "only base64 data URIs are supported".to_string())?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| e.to_string())?;
    image::load_from_memory(&bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| e.to_string())
}

fn truncate(src: &str) -> &str {
    match src.char_indices().nth(64) {
        Some((i, _)) => &src[..i],
        None => src,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filters
// ─────────────────────────────────────────────────────────────────────────────

/// Apply a CSS `filter` list (`contrast`, `brightness`, `saturate`) in order.
/// Unknown functions are ignored.
pub fn apply_filter(canvas: &mut RgbaImage, filter: &str) {
    let functions: Vec<(String, f32)> = split_top_level(filter, ' ')
        .into_iter()
        .filter_map(|f| {
            let (name, rest) = f.split_once('(')?;
            let arg = rest.strip_suffix(')')?.trim();
            let amount = match arg.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
                None => arg.parse::<f32>().ok()?,
            };
            Some((name.trim().to_ascii_lowercase(), amount))
        })
        .collect();
    if functions.is_empty() {
        return;
    }

    for pixel in canvas.pixels_mut() {
        if pixel[3] == 0 {
            continue;
        }
        let mut rgb = [
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
        ];
        for (name, amount) in &functions {
            rgb = match name.as_str() {
                "contrast" => rgb.map(|v| (v - 0.5) * amount + 0.5),
                "brightness" => rgb.map(|v| v * amount),
                "saturate" => saturate(rgb, *amount),
                _ => rgb,
            };
            rgb = rgb.map(|v| v.clamp(0.0, 1.0));
        }
        pixel[0] = (rgb[0] * 255.0).round() as u8;
        pixel[1] = (rgb[1] * 255.0).round() as u8;
        pixel[2] = (rgb[2] * 255.0).round() as u8;
    }
}

fn saturate([r, g, b]: [f32; 3], s: f32) -> [f32; 3] {
    [
        (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
        (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
        (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::progress::{ExportProgress, ProgressReporter};
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    fn render(element: &Element, inherited: &InheritedStyle, config: RasterConfig) -> RgbaImage {
        let mut sink = |_: &ExportProgress| {};
        let mut reporter = ProgressReporter::new(&mut sink);
        Rasterizer::new(config)
            .render(element, inherited, &mut reporter)
            .unwrap()
    }

    fn px(image: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
        image.get_pixel(x, y).0
    }

    #[test]
    fn test_var_resolution_with_fallback_and_nesting() {
        let mut props = BTreeMap::new();
        props.insert("--a".to_string(), "var(--b)".to_string());
        props.insert("--b".to_string(), "#ff0000".to_string());
        assert_eq!(resolve_vars("var(--a)", &props), "#ff0000");
        assert_eq!(resolve_vars("var(--missing, blue)", &props), "blue");
        assert_eq!(resolve_vars("var(--missing)", &props), "");
        assert_eq!(
            resolve_vars("var(--nope, rgba(0, 0, 0, 0.5))", &props),
            "rgba(0, 0, 0, 0.5)"
        );
    }

    #[test]
    fn test_size_and_scale() {
        let el = Element::new("div").with_rect(0.0, 0.0, 10.0, 5.0);
        let image = render(&el, &InheritedStyle::default(), RasterConfig::new().with_scale(2.0));
        assert_eq!(image.dimensions(), (20, 10));
    }

    #[test]
    fn test_overflowing_child_grows_capture() {
        let el = Element::new("div")
            .with_rect(0.0, 0.0, 10.0, 10.0)
            .with_child(Element::new("p").with_rect(0.0, 8.0, 10.0, 12.0));
        let image = render(&el, &InheritedStyle::default(), RasterConfig::new());
        assert_eq!(image.dimensions(), (10, 20));
    }

    #[test]
    fn test_background_transparent_vs_opaque() {
        let el = Element::new("div").with_rect(0.0, 0.0, 4.0, 4.0);
        let clear = render(&el, &InheritedStyle::default(), RasterConfig::new());
        assert_eq!(px(&clear, 0, 0)[3], 0);

        let white = render(
            &el,
            &InheritedStyle::default(),
            RasterConfig::new().with_background(Some(Color::WHITE)),
        );
        assert_eq!(px(&white, 3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn test_theme_variable_background() {
        let mut doc = Document::new("https://example.com/");
        doc.root.style.set("--theme-primary", "#dc143c");
        doc.body_mut().unwrap().children.push(
            Element::new("div")
                .with_id("card")
                .with_rect(0.0, 0.0, 4.0, 4.0)
                .with_style("background: var(--theme-primary)"),
        );
        let path = doc.find_by_id("card").unwrap();
        let inherited = InheritedStyle::for_node(&doc, &path);
        let image = render(doc.node(&path).unwrap(), &inherited, RasterConfig::new());
        assert_eq!(px(&image, 1, 1), [220, 20, 60, 255]);
    }

    #[test]
    fn test_ignored_and_hidden_children_not_painted() {
        let el = Element::new("div")
            .with_rect(0.0, 0.0, 6.0, 2.0)
            .with_child(
                Element::new("span")
                    .with_class("no-export")
                    .with_rect(0.0, 0.0, 2.0, 2.0)
                    .with_style("background: red"),
            )
            .with_child(
                Element::new("span")
                    .with_rect(2.0, 0.0, 2.0, 2.0)
                    .with_style("background: red; display: none"),
            )
            .with_child(
                Element::new("span")
                    .with_rect(4.0, 0.0, 2.0, 2.0)
                    .with_style("background: red"),
            );
        let image = render(&el, &InheritedStyle::default(), RasterConfig::new());
        assert_eq!(px(&image, 0, 0)[3], 0);
        assert_eq!(px(&image, 2, 0)[3], 0);
        assert_eq!(px(&image, 4, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_overflow_hidden_clips_children() {
        let el = Element::new("div")
            .with_rect(0.0, 0.0, 4.0, 4.0)
            .with_child(
                Element::new("div")
                    .with_rect(0.0, 0.0, 2.0, 2.0)
                    .with_style("overflow: hidden")
                    .with_child(
                        Element::new("div")
                            .with_rect(0.0, 0.0, 4.0, 4.0)
                            .with_style("background: blue"),
                    ),
            );
        let image = render(
            &el,
            &InheritedStyle::default(),
            RasterConfig::new().with_size(4.0, 4.0),
        );
        assert_eq!(px(&image, 1, 1), [0, 0, 255, 255]);
        assert_eq!(px(&image, 3, 3)[3], 0);
    }

    #[test]
    fn test_opacity_blends() {
        let el = Element::new("div")
            .with_rect(0.0, 0.0, 2.0, 2.0)
            .with_style("background: black; opacity: 0.5");
        let image = render(
            &el,
            &InheritedStyle::default(),
            RasterConfig::new().with_background(Some(Color::WHITE)),
        );
        let [r, _, _, a] = px(&image, 0, 0);
        assert_eq!(a, 255);
        assert!((120..=135).contains(&r));
    }

    #[test]
    fn test_text_uses_inherited_color() {
        let el = Element::new("p")
            .with_rect(0.0, 0.0, 100.0, 20.0)
            .with_style("color: #00ff00; font-size: 10px")
            .with_text("Phantom Thief");
        let image = render(&el, &InheritedStyle::default(), RasterConfig::new());
        // First bar sits in the middle of the first 12px line.
        assert_eq!(px(&image, 1, 6), [0, 255, 0, 255]);
        assert_eq!(px(&image, 1, 0)[3], 0);
    }

    #[test]
    fn test_data_uri_image_loads() {
        let mut bytes = Vec::new();
        let source = RgbaImage::from_pixel(2, 2, Rgba([255, 215, 0, 255]));
        PngEncoder::new(&mut bytes)
            .write_image(source.as_raw(), 2, 2, image::ExtendedColorType::Rgba8)
            .unwrap();
        let src = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );
        let el = Element::new("img")
            .with_attr("src", &src)
            .with_rect(0.0, 0.0, 4.0, 4.0);
        let image = render(&el, &InheritedStyle::default(), RasterConfig::new());
        assert_eq!(px(&image, 2, 2), [255, 215, 0, 255]);
    }

    #[test]
    fn test_huge_image_box_only_samples_visible_pixels() {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(&[0, 0, 255, 255], 1, 1, image::ExtendedColorType::Rgba8)
            .unwrap();
        let src = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );
        let el = Element::new("img")
            .with_attr("src", &src)
            .with_rect(0.0, 0.0, 12_000.0, 12_000.0);

        let started = std::time::Instant::now();
        let image = render(
            &el,
            &InheritedStyle::default(),
            RasterConfig::new().with_size(2.0, 2.0),
        );
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(px(&image, 1, 1), [0, 0, 255, 255]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_missing_image_is_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = load_image("avatar.png", Some(dir.path()), Duration::from_millis(500));
        assert!(loaded.is_none());
        assert!(load_image("https://example.com/a.png", None, Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_image_relative_to_base_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("dot.png"))
            .unwrap();
        let loaded = load_image("/dot.png", Some(dir.path()), Duration::from_secs(5)).unwrap();
        assert_eq!(loaded.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_filter_functions() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        apply_filter(&mut canvas, "brightness(2)");
        assert_eq!(canvas.get_pixel(0, 0).0, [200, 200, 200, 255]);

        let mut gray = RgbaImage::from_pixel(1, 1, Rgba([128, 128, 128, 255]));
        apply_filter(&mut gray, "saturate(1.5)");
        let [r, g, b, _] = gray.get_pixel(0, 0).0;
        assert!(r.abs_diff(128) <= 1 && g.abs_diff(128) <= 1 && b.abs_diff(128) <= 1);

        let mut clear = RgbaImage::new(1, 1);
        apply_filter(&mut clear, "contrast(2)");
        assert_eq!(clear.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
