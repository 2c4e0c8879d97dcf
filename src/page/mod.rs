//! Page model for phantom-card
//!
//! The resume page is represented as a tree of [`Element`]s rooted at the
//! document element (`<html>`). Each element carries its tag, id, classes,
//! attributes, inline style, measured box, and optional text. A page snapshot
//! is plain JSON, so the same tree can be produced by a renderer, a test, or
//! a hand-written fixture.
//!
//! # Architecture
//!
//! - `style.rs` - Inline style declarations and length parsing
//! - `color.rs` - CSS colors and background paints

pub mod color;
pub mod style;

pub use color::{Color, Paint};
pub use style::InlineStyle;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// An element's box in CSS pixels, relative to its parent's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Child-index path from the document element to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    /// The document element itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th child of this node.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    /// Every proper ancestor path, outermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (0..self.0.len()).map(move |len| NodePath(self.0[..len].to_vec()))
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Element
// ─────────────────────────────────────────────────────────────────────────────

/// A node in the page tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: InlineStyle,
    pub rect: Rect,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_style(mut self, css: &str) -> Self {
        let parsed = InlineStyle::parse(css);
        for (property, value) in parsed.iter() {
            self.style.set(property, value);
        }
        self
    }

    pub fn with_rect(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.rect = Rect::new(x, y, width, height);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    /// Width from an inline `width` override, else the measured box.
    pub fn box_width(&self) -> f32 {
        self.style.px("width").unwrap_or(self.rect.width)
    }

    /// Height from inline `height`/`min-height` overrides, else the measured box.
    pub fn box_height(&self) -> f32 {
        let height = self.style.px("height").unwrap_or(self.rect.height);
        match self.style.px("min-height") {
            Some(min) => height.max(min),
            None => height,
        }
    }

    /// Size of the content area including descendants that overflow the box,
    /// the analogue of `scrollWidth`/`scrollHeight`.
    pub fn scroll_size(&self) -> (f32, f32) {
        let mut width = self.box_width();
        let mut height = self.box_height();
        for child in &self.children {
            if child.style.get("position") == Some("fixed")
                || child.style.get("display") == Some("none")
            {
                continue;
            }
            let (cw, ch) = child.scroll_size();
            width = width.max(child.rect.x + cw);
            height = height.max(child.rect.y + ch);
        }
        (width, height)
    }

    /// Get a descendant by a path relative to this element.
    pub fn descendant(&self, path: &[usize]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Get a mutable descendant by a path relative to this element.
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get_mut(index))
    }

    /// Pre-order search for the first element with the given id, in document order.
    pub fn find_by_id(&self, id: &str) -> Option<NodePath> {
        fn search(node: &Element, id: &str, path: &mut Vec<usize>) -> bool {
            if node.id.as_deref() == Some(id) {
                return true;
            }
            for (index, child) in node.children.iter().enumerate() {
                path.push(index);
                if search(child, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(self, id, &mut path).then_some(NodePath(path))
    }

    /// Pre-order search for the first element with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodePath> {
        let mut found = None;
        self.walk(&mut |path, node| {
            if found.is_none() && node.tag == tag {
                found = Some(NodePath(path.to_vec()));
            }
        });
        found
    }

    /// Visit every descendant (not this element) with its relative path.
    pub fn walk(&self, visit: &mut dyn FnMut(&[usize], &Element)) {
        fn recurse(node: &Element, path: &mut Vec<usize>, visit: &mut dyn FnMut(&[usize], &Element)) {
            for (index, child) in node.children.iter().enumerate() {
                path.push(index);
                visit(path, child);
                recurse(child, path, visit);
                path.pop();
            }
        }
        recurse(self, &mut Vec::new(), visit);
    }

    /// Mutably visit every descendant (not this element) with its relative path.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&[usize], &mut Element)) {
        fn recurse(
            node: &mut Element,
            path: &mut Vec<usize>,
            visit: &mut dyn FnMut(&[usize], &mut Element),
        ) {
            for (index, child) in node.children.iter_mut().enumerate() {
                path.push(index);
                visit(path, child);
                recurse(child, path, visit);
                path.pop();
            }
        }
        recurse(self, &mut Vec::new(), visit);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// A page: its URL plus the document element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub root: Element,
}

impl Document {
    /// Create an empty page with `<html>`, `<head>` and `<body>`.
    pub fn new(url: &str) -> Self {
        let root = Element::new("html")
            .with_child(Element::new("head"))
            .with_child(Element::new("body"));
        Self {
            url: url.to_string(),
            root,
        }
    }

    /// Load a page snapshot from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn node(&self, path: &NodePath) -> Option<&Element> {
        self.root.descendant(&path.0)
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut Element> {
        self.root.descendant_mut(&path.0)
    }

    /// `document.getElementById`.
    pub fn find_by_id(&self, id: &str) -> Option<NodePath> {
        self.root.find_by_id(id)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<&Element> {
        self.find_by_id(id).and_then(|path| self.node(&path))
    }

    pub fn body_path(&self) -> Option<NodePath> {
        self.root.find_by_tag("body")
    }

    pub fn head_path(&self) -> Option<NodePath> {
        self.root.find_by_tag("head")
    }

    pub fn body_mut(&mut self) -> Option<&mut Element> {
        let path = self.body_path()?;
        self.node_mut(&path)
    }

    /// Top-left corner of a node in page coordinates.
    pub fn absolute_origin(&self, path: &NodePath) -> (f32, f32) {
        let mut x = self.root.rect.x;
        let mut y = self.root.rect.y;
        let mut node = &self.root;
        for &index in &path.0 {
            match node.children.get(index) {
                Some(child) => {
                    x += child.rect.x;
                    y += child.rect.y;
                    node = child;
                }
                None => break,
            }
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new("https://example.com/resume");
        let body = doc.body_mut().unwrap();
        body.children.push(
            Element::new("section")
                .with_id("hero-section")
                .with_rect(10.0, 20.0, 300.0, 200.0)
                .with_child(Element::new("div").with_id("share-card").with_rect(5.0, 5.0, 100.0, 50.0)),
        );
        doc
    }

    #[test]
    fn test_find_by_id_returns_path() {
        let doc = sample();
        let path = doc.find_by_id("share-card").unwrap();
        assert_eq!(path, NodePath(vec![1, 0, 0]));
        assert_eq!(doc.node(&path).unwrap().tag, "div");
        assert!(doc.find_by_id("missing").is_none());
    }

    #[test]
    fn test_absolute_origin_sums_offsets() {
        let doc = sample();
        let path = doc.find_by_id("share-card").unwrap();
        assert_eq!(doc.absolute_origin(&path), (15.0, 25.0));
    }

    #[test]
    fn test_scroll_size_includes_overflowing_children() {
        let el = Element::new("div")
            .with_rect(0.0, 0.0, 100.0, 100.0)
            .with_child(Element::new("p").with_rect(50.0, 80.0, 100.0, 60.0));
        assert_eq!(el.scroll_size(), (150.0, 140.0));
    }

    #[test]
    fn test_box_size_prefers_inline_overrides() {
        let el = Element::new("div")
            .with_rect(0.0, 0.0, 100.0, 100.0)
            .with_style("width: 1200px; height: 300px; min-height: 630px");
        assert_eq!(el.box_width(), 1200.0);
        assert_eq!(el.box_height(), 630.0);
    }

    #[test]
    fn test_ancestors_outermost_first() {
        let path = NodePath(vec![1, 0, 2]);
        let ancestors: Vec<_> = path.ancestors().collect();
        assert_eq!(
            ancestors,
            vec![NodePath(vec![]), NodePath(vec![1]), NodePath(vec![1, 0])]
        );
    }

    #[test]
    fn test_document_json_snapshot() {
        let json = r#"{
            "url": "https://example.com/",
            "root": {"tag": "html", "children": [
                {"tag": "body", "children": [
                    {"tag": "div", "id": "anime-resume", "style": {"overflow": "hidden"},
                     "rect": {"width": 640, "height": 480}}
                ]}
            ]}
        }"#;
        let doc = Document::from_json(json).unwrap();
        let el = doc.get_element_by_id("anime-resume").unwrap();
        assert_eq!(el.style.get("overflow"), Some("hidden"));
        assert_eq!(el.rect.width, 640.0);
    }
}
