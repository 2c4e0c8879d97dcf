//! Theme System for phantom-card
//!
//! This module defines the visual theme catalog and the engine that makes
//! exactly one theme active for the whole page.
//!
//! # Architecture
//!
//! A [`ThemeRegistry`] holds a fixed list of [`Theme`]s plus the id of the
//! designated default. The [`ThemeEngine`] applies the active theme to the
//! page as CSS custom properties on the document element, persists the
//! selection through a [`ThemeStorage`](crate::config::ThemeStorage), and
//! supports a transient preview that never touches storage.
//!
//! # Usage
//!
//! ```ignore
//! use phantom_card::theme::{ThemeEngine, ThemeRegistry};
//! use phantom_card::config::MemoryThemeStorage;
//!
//! let mut engine = ThemeEngine::new(ThemeRegistry::builtin(), Box::new(MemoryThemeStorage::default()));
//! engine.initialize(&mut document);
//! engine.set_theme(&mut document, "ninja");
//! ```
//!
//! # Theme Files
//!
//! - `catalog.rs` - Built-in themes and the hardcoded fallback theme
//! - `apply.rs` - Writing theme variables onto the document element
//! - `engine.rs` - State machine, persistence and subscriptions
//! - `menu.rs` - Keyboard navigation for the theme switcher menu

pub mod apply;
pub mod catalog;
pub mod engine;
pub mod menu;

pub use engine::{SubscriptionId, ThemeEngine, ThemeEvent, ThemeState};
pub use menu::{MenuKey, ThemeMenu};

use crate::error::{Error, Result, ResultExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

// ─────────────────────────────────────────────────────────────────────────────
// Theme
// ─────────────────────────────────────────────────────────────────────────────

/// Color palette of a theme. The first four are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    /// A color or a `linear-gradient(...)`
    pub background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_muted: Option<String>,
}

/// A named visual theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub colors: ThemeColors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Extra custom properties (`--theme-glow`, particle colors, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub effects: BTreeMap<String, String>,
}

impl Theme {
    fn validate(&self) -> Result<()> {
        let required = [
            ("primary", &self.colors.primary),
            ("secondary", &self.colors.secondary),
            ("accent", &self.colors.accent),
            ("background", &self.colors.background),
        ];
        if self.id.trim().is_empty() {
            return Err(Error::ThemeRegistry("theme with empty id".to_string()));
        }
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::ThemeRegistry(format!(
                    "theme \"{}\" is missing the {} color",
                    self.id, name
                )));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Theme Registry
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk shape of a theme catalog file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryFile {
    default_theme: String,
    themes: Vec<Theme>,
}

/// The fixed catalog of themes available for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeRegistry {
    themes: Vec<Theme>,
    default_id: String,
}

impl ThemeRegistry {
    /// Build a registry, checking ids are unique, required colors are present,
    /// and the default exists.
    pub fn new(themes: Vec<Theme>, default_id: &str) -> Result<Self> {
        let mut seen = HashSet::new();
        for theme in &themes {
            theme.validate()?;
            if !seen.insert(theme.id.as_str()) {
                return Err(Error::ThemeRegistry(format!(
                    "duplicate theme id \"{}\"",
                    theme.id
                )));
            }
        }
        if !seen.contains(default_id) {
            return Err(Error::ThemeRegistry(format!(
                "default theme \"{}\" is not in the catalog",
                default_id
            )));
        }
        Ok(Self {
            themes,
            default_id: default_id.to_string(),
        })
    }

    /// The built-in phantom thief catalog.
    pub fn builtin() -> Self {
        Self {
            themes: catalog::builtin_themes(),
            default_id: catalog::DEFAULT_THEME_ID.to_string(),
        }
    }

    /// The single hardcoded theme used when no catalog can be loaded.
    pub fn minimal() -> Self {
        let theme = catalog::fallback_theme();
        Self {
            default_id: theme.id.clone(),
            themes: vec![theme],
        }
    }

    /// Parse a catalog from JSON: `{"defaultTheme": "...", "themes": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(json)?;
        Self::new(file.themes, &file.default_theme)
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading theme catalog from: {}", path.display());
        let contents = fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        let registry = Self::from_json(&contents)?;
        info!(
            "Loaded {} themes from {}",
            registry.themes.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Load a catalog file, degrading to the minimal hardcoded theme so the
    /// page is never left unthemed.
    pub fn load_or_fallback(path: &Path) -> Self {
        Self::load(path).unwrap_or_warn_default(Self::minimal(), "Failed to load theme catalog")
    }

    pub fn get(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn default_theme(&self) -> &Theme {
        // `new` and the constructors guarantee the default is present.
        self.get(&self.default_id).unwrap_or(&self.themes[0])
    }

    /// Resolve an id to a theme in the catalog, falling back to the default.
    pub fn resolve(&self, id: Option<&str>) -> &Theme {
        id.and_then(|id| self.get(id))
            .unwrap_or_else(|| self.default_theme())
    }

    pub fn all(&self) -> &[Theme] {
        &self.themes
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.themes.iter().position(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_registry_has_default() {
        let registry = ThemeRegistry::builtin();
        assert_eq!(registry.default_id(), "persona");
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.default_theme().name, "Persona 5");
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_default() {
        let registry = ThemeRegistry::builtin();
        assert_eq!(registry.resolve(Some("nope")).id, "persona");
        assert_eq!(registry.resolve(None).id, "persona");
        assert_eq!(registry.resolve(Some("ninja")).id, "ninja");
    }

    #[test]
    fn test_registry_rejects_missing_required_color() {
        let mut theme = catalog::fallback_theme();
        theme.colors.accent = String::new();
        let result = ThemeRegistry::new(vec![theme], "phantom");
        assert!(matches!(result, Err(Error::ThemeRegistry(_))));
    }

    #[test]
    fn test_registry_rejects_duplicates_and_missing_default() {
        let theme = catalog::fallback_theme();
        assert!(ThemeRegistry::new(vec![theme.clone(), theme.clone()], "phantom").is_err());
        assert!(ThemeRegistry::new(vec![theme], "persona").is_err());
    }

    #[test]
    fn test_from_json_catalog() {
        let json = r##"{
            "defaultTheme": "noir",
            "themes": [{
                "id": "noir", "name": "Noir",
                "colors": {"primary": "#ffffff", "secondary": "#000000",
                           "accent": "#888888", "background": "#111111",
                           "textMuted": "#999999"}
            }]
        }"##;
        let registry = ThemeRegistry::from_json(json).unwrap();
        let noir = registry.get("noir").unwrap();
        assert_eq!(noir.colors.text_muted.as_deref(), Some("#999999"));
        assert!(noir.effects.is_empty());
    }

    #[test]
    fn test_load_or_fallback_missing_file() {
        let dir = TempDir::new().unwrap();
        let registry = ThemeRegistry::load_or_fallback(&dir.path().join("themes.json"));
        assert_eq!(registry, ThemeRegistry::minimal());
        assert_eq!(registry.default_id(), "phantom");
    }

    #[test]
    fn test_load_or_fallback_corrupted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("themes.json");
        fs::write(&path, "{ not json").unwrap();
        let registry = ThemeRegistry::load_or_fallback(&path);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_index_of() {
        let registry = ThemeRegistry::builtin();
        assert_eq!(registry.index_of("persona"), Some(0));
        assert_eq!(registry.index_of("mech"), Some(3));
        assert_eq!(registry.index_of("x"), None);
    }
}
