//! Inline style declarations for page elements
//!
//! An `InlineStyle` is the analogue of an element's `style` attribute: an
//! ordered set of `property: value` declarations, including CSS custom
//! properties (`--theme-primary`).

use super::color::split_top_level;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inline style declarations keyed by property name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineStyle {
    declarations: BTreeMap<String, String>,
}

impl InlineStyle {
    /// Create an empty declaration block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute string such as `"overflow: hidden; width: 10px"`.
    ///
    /// Declarations without a colon are ignored, like a browser would.
    pub fn parse(css: &str) -> Self {
        let mut style = Self::new();
        for declaration in split_top_level(css, ';') {
            if let Some((property, value)) = declaration.split_once(':') {
                let property = property.trim();
                let value = value.trim();
                if !property.is_empty() && !value.is_empty() {
                    style.set(property, value);
                }
            }
        }
        style
    }

    /// Get a declared value.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations.get(property).map(String::as_str)
    }

    /// Set a declaration, replacing any previous value.
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        self.declarations.insert(property.to_string(), value.into());
    }

    /// Remove a declaration, returning the old value.
    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.declarations.remove(property)
    }

    /// Put a previously captured value back: `Some` sets it, `None` removes it.
    pub fn restore(&mut self, property: &str, previous: Option<String>) {
        match previous {
            Some(value) => self.set(property, value),
            None => {
                self.remove(property);
            }
        }
    }

    /// Whether a property is declared.
    pub fn contains(&self, property: &str) -> bool {
        self.declarations.contains_key(property)
    }

    /// Iterate over all declarations in property order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over custom properties (`--name`).
    pub fn custom_properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .filter(|(k, _)| k.starts_with("--"))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether there are no declarations.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Parse a pixel length (`"1200px"` or a bare number).
    pub fn px(&self, property: &str) -> Option<f32> {
        parse_px(self.get(property)?)
    }
}

/// Parse a CSS pixel length. Other units are not resolved.
pub fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Parse a CSS time value (`"0s"`, `"300ms"`) into milliseconds.
pub fn parse_time_ms(value: &str) -> Option<f32> {
    let value = value.trim();
    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse().ok()
    } else if let Some(s) = value.strip_suffix('s') {
        s.trim().parse::<f32>().ok().map(|s| s * 1000.0)
    } else {
        None
    }
}
