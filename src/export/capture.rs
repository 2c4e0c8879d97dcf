//! Capture preparation
//!
//! Locating the element to export, deciding which nodes are left out of a
//! capture, normalizing the detached clone that gets painted, and scoped
//! style overrides on the live element that always restore.

use super::options::{ExportFormat, ExportTarget};
use crate::error::{Error, Result};
use crate::page::{Document, Element, NodePath};
use log::{debug, warn};
use std::ops::{Deref, DerefMut};

/// Ids probed, in order, when no target is given.
pub const FALLBACK_TARGET_IDS: [&str; 3] = ["share-card", "hero-section", "anime-resume"];

/// Longer probe list used by [`get_export_element`].
pub const COMMON_EXPORT_IDS: [&str; 5] = [
    "share-card",
    "hero-section",
    "anime-resume",
    "main-content",
    "app",
];

/// Font stack pinned on the capture clone.
pub const EXPORT_FONT_STACK: &str =
    r#"system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif"#;

const IGNORED_CLASSES: [&str; 3] = ["no-export", "export-ignore", "no-print"];
const IGNORED_TAGS: [&str; 2] = ["script", "noscript"];

// ─────────────────────────────────────────────────────────────────────────────
// Target Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Find the element an export runs against.
pub fn resolve_target(document: &Document, target: &ExportTarget) -> Result<NodePath> {
    match target {
        ExportTarget::Node(path) => document
            .node(path)
            .map(|_| path.clone())
            .ok_or_else(|| Error::ElementNotFound(path.to_string())),
        ExportTarget::Id(id) => document
            .find_by_id(id)
            .ok_or_else(|| Error::ElementNotFound(id.clone())),
        ExportTarget::Auto => FALLBACK_TARGET_IDS
            .iter()
            .find_map(|id| document.find_by_id(id))
            .ok_or(Error::NoTargetFound),
    }
}

/// Best element to export: the preferred id, then the common ids, then `<body>`.
pub fn get_export_element(document: &Document, preferred_id: Option<&str>) -> Option<NodePath> {
    preferred_id
        .and_then(|id| document.find_by_id(id))
        .or_else(|| {
            COMMON_EXPORT_IDS
                .iter()
                .find_map(|id| document.find_by_id(id))
        })
        .or_else(|| document.body_path())
}

/// Whether an element (and its subtree) is left out of captures.
pub fn is_ignored(element: &Element) -> bool {
    IGNORED_CLASSES.iter().any(|c| element.has_class(c))
        || element.attr("data-no-export") == Some("true")
        || IGNORED_TAGS.contains(&element.tag.as_str())
}

// ─────────────────────────────────────────────────────────────────────────────
// Clone Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Post-process filter applied to a capture, if the format has one.
pub fn export_filter(format: ExportFormat) -> Option<&'static str> {
    match format {
        ExportFormat::Png => Some("contrast(1.05) brightness(1.02) saturate(1.1)"),
        ExportFormat::Jpg => Some("contrast(1.08) brightness(1.03) saturate(1.05)"),
        _ => None,
    }
}

/// Make a detached clone deterministic to paint. Never call on the live page.
pub fn normalize_clone(clone: &mut Element, format: ExportFormat) {
    clone.style.set("font-family", EXPORT_FONT_STACK);
    if let Some(filter) = export_filter(format) {
        clone.style.set("filter", filter);
    }
    freeze_motion(clone);

    let mut repositioned = 0usize;
    clone.walk_mut(&mut |_, node| {
        if node.style.get("position") == Some("fixed") || node.has_class("fixed") {
            node.style.set("position", "absolute");
            repositioned += 1;
        }
        freeze_motion(node);
    });
    debug!(
        "Normalized clone <{}>: {} fixed descendants repositioned",
        clone.tag, repositioned
    );
}

fn freeze_motion(element: &mut Element) {
    element.style.set("animation-play-state", "paused");
    element.style.set("animation-delay", "0s");
    element.style.set("transition-duration", "0s");
}

// ─────────────────────────────────────────────────────────────────────────────
// Scoped Style Overrides
// ─────────────────────────────────────────────────────────────────────────────

/// Inline style overrides on a live element that are undone on drop.
///
/// The first value seen for each `(node, property)` is the one restored, so
/// layering several overrides on the same property is safe.
pub struct StyleGuard<'e> {
    element: &'e mut Element,
    saved: Vec<(Vec<usize>, String, Option<String>)>,
    restored: bool,
}

impl<'e> StyleGuard<'e> {
    pub fn new(element: &'e mut Element) -> Self {
        Self {
            element,
            saved: Vec::new(),
            restored: false,
        }
    }

    /// Override a property on the guarded element itself.
    pub fn set(&mut self, property: &str, value: &str) {
        self.set_at(&[], property, value);
    }

    /// Override a property on a descendant addressed by a relative path.
    pub fn set_at(&mut self, path: &[usize], property: &str, value: &str) {
        let Some(node) = self.element.descendant_mut(path) else {
            return;
        };
        let already_saved = self
            .saved
            .iter()
            .any(|(p, prop, _)| p == path && prop == property);
        if !already_saved {
            let previous = node.style.get(property).map(str::to_string);
            self.saved.push((path.to_vec(), property.to_string(), previous));
        }
        node.style.set(property, value);
    }

    /// Number of distinct overrides held.
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// Put every overridden property back. Idempotent.
    pub fn restore(&mut self) {
        if self.restored {
            return;
        }
        for (path, property, previous) in self.saved.drain(..).rev() {
            match self.element.descendant_mut(&path) {
                Some(node) => node.style.restore(&property, previous),
                None => warn!("Cannot restore {} at {:?}: node gone", property, path),
            }
        }
        self.restored = true;
    }
}

impl Deref for StyleGuard<'_> {
    type Target = Element;

    fn deref(&self) -> &Element {
        &*self.element
    }
}

impl DerefMut for StyleGuard<'_> {
    fn deref_mut(&mut self) -> &mut Element {
        &mut *self.element
    }
}

impl Drop for StyleGuard<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// A live element switched into export-friendly styles.
pub type PreparedElement<'e> = StyleGuard<'e>;

/// Make a live element capture-friendly until the returned guard is
/// restored or dropped.
///
/// The element gets `overflow: visible`, `height: auto`, `max-height: none`
/// (plus `position: relative` and `transform: none` for social cards), and
/// every descendant has its animations paused and transitions zeroed.
pub fn prepare_element_for_export(element: &mut Element, social_media: bool) -> PreparedElement<'_> {
    let mut descendants = Vec::new();
    element.walk(&mut |path, _| descendants.push(path.to_vec()));

    let mut guard = StyleGuard::new(element);
    guard.set("overflow", "visible");
    guard.set("height", "auto");
    guard.set("max-height", "none");
    if social_media {
        guard.set("position", "relative");
        guard.set("transform", "none");
    }
    for path in &descendants {
        guard.set_at(path, "animation-play-state", "paused");
        guard.set_at(path, "transition-duration", "0s");
    }
    debug!(
        "Prepared element for export ({} overrides, social: {})",
        guard.len(),
        social_media
    );
    guard
}

// ─────────────────────────────────────────────────────────────────────────────
// Readiness Check
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of [`validate_export_readiness`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReadiness {
    pub ready: bool,
    pub issues: Vec<String>,
}

const MIN_EXPORT_SIZE: f32 = 100.0;
const MAX_ANIMATED_ELEMENTS: usize = 10;

/// Advisory pre-flight check of an export target.
pub fn validate_export_readiness(document: &Document, element_id: &str) -> ExportReadiness {
    let mut issues = Vec::new();
    let Some(element) = document.get_element_by_id(element_id) else {
        issues.push(format!("Element with ID \"{}\" not found", element_id));
        return ExportReadiness {
            ready: false,
            issues,
        };
    };

    if element.style.get("display") == Some("none")
        || element.style.get("visibility") == Some("hidden")
    {
        issues.push("Target element is not visible".to_string());
    }

    if element.box_width() < MIN_EXPORT_SIZE || element.box_height() < MIN_EXPORT_SIZE {
        issues.push("Target element dimensions are too small".to_string());
    }

    let mut animated = 0usize;
    element.walk(&mut |_, node| {
        let inline_animation = node.style.iter().any(|(p, _)| p.starts_with("animation"));
        let animate_class = node.classes.iter().any(|c| c.starts_with("animate-"));
        if inline_animation || animate_class {
            animated += 1;
        }
    });
    if animated > MAX_ANIMATED_ELEMENTS {
        issues.push(
            "Many animated elements detected - export might capture mid-animation".to_string(),
        );
    }

    ExportReadiness {
        ready: issues.is_empty(),
        issues,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
