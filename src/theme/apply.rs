//! Writing theme variables onto the page
//!
//! The active theme lives on the document element as CSS custom properties
//! plus a `data-theme` attribute, and as the `theme-color` meta hint under
//! `<head>`. Everything below writes only those places.

use super::Theme;
use crate::page::color::hex_to_rgb;
use crate::page::{Document, Element};
use log::debug;

/// Attribute carrying the active theme id on the document element.
pub const THEME_ATTRIBUTE: &str = "data-theme";

const DEFAULT_TEXT: &str = "#ffffff";
const DEFAULT_TEXT_MUTED: &str = "#a1a1aa";

/// Every custom property a full apply writes, in write order.
pub fn theme_variables(theme: &Theme) -> Vec<(String, String)> {
    let colors = &theme.colors;
    let mut vars = vec![
        ("--theme-primary".to_string(), colors.primary.clone()),
        ("--theme-secondary".to_string(), colors.secondary.clone()),
        ("--theme-accent".to_string(), colors.accent.clone()),
        ("--theme-background".to_string(), colors.background.clone()),
        (
            "--theme-surface".to_string(),
            colors
                .surface
                .clone()
                .unwrap_or_else(|| format!("{}20", colors.primary)),
        ),
        (
            "--theme-text".to_string(),
            colors.text.clone().unwrap_or_else(|| DEFAULT_TEXT.to_string()),
        ),
        (
            "--theme-text-muted".to_string(),
            colors
                .text_muted
                .clone()
                .unwrap_or_else(|| DEFAULT_TEXT_MUTED.to_string()),
        ),
    ];
    if let Some((r, g, b)) = hex_to_rgb(&colors.primary) {
        vars.push((
            "--theme-primary-rgb".to_string(),
            format!("{}, {}, {}", r, g, b),
        ));
    }
    vars.extend(theme.effects.iter().map(|(k, v)| (k.clone(), v.clone())));
    vars
}

/// Apply the full variable set, the `data-theme` attribute and the
/// browser-chrome color hint.
pub fn apply_theme(document: &mut Document, theme: &Theme) {
    let root = &mut document.root;
    root.set_attr(THEME_ATTRIBUTE, &theme.id);
    for (property, value) in theme_variables(theme) {
        root.style.set(&property, value);
    }
    set_theme_color_meta(document, &theme.colors.primary);
    debug!("Applied theme variables for \"{}\"", theme.id);
}

/// Lightweight preview: only primary and accent, nothing else touched.
pub fn apply_preview(document: &mut Document, theme: &Theme) {
    let style = &mut document.root.style;
    style.set("--theme-primary", theme.colors.primary.clone());
    style.set("--theme-accent", theme.colors.accent.clone());
}

/// The theme id currently written on the document element, if any.
pub fn applied_theme_id(document: &Document) -> Option<&str> {
    document.root.attr(THEME_ATTRIBUTE)
}

fn set_theme_color_meta(document: &mut Document, color: &str) {
    let Some(head_path) = document.head_path() else {
        return;
    };
    let Some(head) = document.node_mut(&head_path) else {
        return;
    };
    let existing = head
        .children
        .iter_mut()
        .find(|el| el.tag == "meta" && el.attr("name") == Some("theme-color"));
    match existing {
        Some(meta) => meta.set_attr("content", color),
        None => head.children.push(
            Element::new("meta")
                .with_attr("name", "theme-color")
                .with_attr("content", color),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::catalog::{builtin_themes, fallback_theme};

    #[test]
    fn test_full_apply_writes_variables_and_attribute() {
        let mut doc = Document::new("https://example.com/");
        let ninja = builtin_themes().remove(1);
        apply_theme(&mut doc, &ninja);

        let style = &doc.root.style;
        assert_eq!(style.get("--theme-primary"), Some("#00a86b"));
        assert_eq!(style.get("--theme-primary-rgb"), Some("0, 168, 107"));
        assert_eq!(style.get("--theme-particle-3"), Some("#32cd32"));
        assert_eq!(applied_theme_id(&doc), Some("ninja"));
    }

    #[test]
    fn test_optional_colors_get_defaults() {
        let vars = theme_variables(&fallback_theme());
        let get = |k: &str| vars.iter().find(|(p, _)| p == k).map(|(_, v)| v.as_str());
        assert_eq!(get("--theme-surface"), Some("#dc143c20"));
        assert_eq!(get("--theme-text"), Some("#ffffff"));
        assert_eq!(get("--theme-text-muted"), Some("#a1a1aa"));
    }

    #[test]
    fn test_theme_color_meta_created_once() {
        let mut doc = Document::new("https://example.com/");
        let themes = builtin_themes();
        apply_theme(&mut doc, &themes[0]);
        apply_theme(&mut doc, &themes[2]);

        let head = doc.node(&doc.head_path().unwrap()).unwrap();
        let metas: Vec<_> = head.children.iter().filter(|e| e.tag == "meta").collect();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].attr("content"), Some("#1e90ff"));
    }

    #[test]
    fn test_preview_touches_only_primary_and_accent() {
        let mut doc = Document::new("https://example.com/");
        let themes = builtin_themes();
        apply_theme(&mut doc, &themes[0]);
        let before = doc.root.style.clone();

        apply_preview(&mut doc, &themes[3]);
        assert_eq!(doc.root.style.get("--theme-primary"), Some("#ff6b00"));
        assert_eq!(doc.root.style.get("--theme-accent"), Some("#00ddff"));
        assert_eq!(doc.root.style.get("--theme-secondary"), before.get("--theme-secondary"));
        assert_eq!(applied_theme_id(&doc), Some("persona"));
    }
}
