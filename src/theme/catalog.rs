//! Built-in theme catalog
//!
//! The four phantom thief themes shipped with the page, and the minimal
//! theme used when no catalog is available at all.

use super::{Theme, ThemeColors};
use std::collections::BTreeMap;

/// Id of the designated default theme in the built-in catalog.
pub const DEFAULT_THEME_ID: &str = "persona";

/// Id of the hardcoded fallback theme.
pub const FALLBACK_THEME_ID: &str = "phantom";

fn effects(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn theme(
    id: &str,
    name: &str,
    colors: [&str; 7],
    icon: &str,
    description: &str,
    effect_entries: &[(&str, &str)],
) -> Theme {
    let [primary, secondary, accent, background, surface, text, text_muted] = colors;
    Theme {
        id: id.to_string(),
        name: name.to_string(),
        colors: ThemeColors {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            accent: accent.to_string(),
            background: background.to_string(),
            surface: Some(surface.to_string()),
            text: Some(text.to_string()),
            text_muted: Some(text_muted.to_string()),
        },
        icon: Some(icon.to_string()),
        description: Some(description.to_string()),
        effects: effects(effect_entries),
    }
}

/// The built-in catalog, in menu order.
pub fn builtin_themes() -> Vec<Theme> {
    vec![
        theme(
            "persona",
            "Persona 5",
            [
                "#dc143c",
                "#000000",
                "#ffd700",
                "linear-gradient(135deg, #0a0a0a 0%, #1a0000 100%)",
                "rgba(220, 20, 60, 0.15)",
                "#ffffff",
                "#cccccc",
            ],
            "🎭",
            "Phantom Thief with dramatic red-black contrast and golden accents",
            &[
                ("--theme-glow", "0 0 20px rgba(220, 20, 60, 0.5)"),
                ("--theme-shadow", "0 4px 20px rgba(0, 0, 0, 0.8)"),
                ("--theme-particle-1", "#dc143c"),
                ("--theme-particle-2", "#ffd700"),
                ("--theme-particle-3", "#ff1744"),
            ],
        ),
        theme(
            "ninja",
            "Shadow Ninja",
            [
                "#00a86b",
                "#0d2818",
                "#90ee90",
                "linear-gradient(135deg, #0a1f0a 0%, #1a2f1a 100%)",
                "rgba(0, 168, 107, 0.12)",
                "#e8f5e8",
                "#a8d8a8",
            ],
            "🥷",
            "Forest stealth with deep greens and bamboo textures",
            &[
                ("--theme-glow", "0 0 15px rgba(0, 168, 107, 0.4)"),
                ("--theme-shadow", "0 4px 20px rgba(0, 50, 20, 0.7)"),
                ("--theme-particle-1", "#00a86b"),
                ("--theme-particle-2", "#90ee90"),
                ("--theme-particle-3", "#32cd32"),
            ],
        ),
        theme(
            "pirate",
            "Ocean Corsair",
            [
                "#1e90ff",
                "#003366",
                "#ffd700",
                "linear-gradient(135deg, #001122 0%, #003355 100%)",
                "rgba(30, 144, 255, 0.12)",
                "#e6f3ff",
                "#b3d9ff",
            ],
            "🏴‍☠️",
            "Deep sea adventure with wave patterns and treasure glints",
            &[
                ("--theme-glow", "0 0 18px rgba(30, 144, 255, 0.4)"),
                ("--theme-shadow", "0 4px 20px rgba(0, 20, 40, 0.8)"),
                ("--theme-particle-1", "#1e90ff"),
                ("--theme-particle-2", "#ffd700"),
                ("--theme-particle-3", "#00bfff"),
            ],
        ),
        theme(
            "mech",
            "Cyber Mech",
            [
                "#ff6b00",
                "#333333",
                "#00ddff",
                "linear-gradient(135deg, #1a1a1a 0%, #2a1a0a 100%)",
                "rgba(255, 107, 0, 0.12)",
                "#fff5e6",
                "#ccb399",
            ],
            "🤖",
            "Industrial tech with circuit patterns and tech glows",
            &[
                ("--theme-glow", "0 0 22px rgba(255, 107, 0, 0.5)"),
                ("--theme-shadow", "0 4px 20px rgba(40, 20, 0, 0.8)"),
                ("--theme-particle-1", "#ff6b00"),
                ("--theme-particle-2", "#00ddff"),
                ("--theme-particle-3", "#ffaa33"),
            ],
        ),
    ]
}

/// A deliberately plain theme: only the required colors.
pub fn fallback_theme() -> Theme {
    Theme {
        id: FALLBACK_THEME_ID.to_string(),
        name: "Phantom".to_string(),
        colors: ThemeColors {
            primary: "#dc143c".to_string(),
            secondary: "#000000".to_string(),
            accent: "#ffd700".to_string(),
            background: "#0a0a0a".to_string(),
            surface: None,
            text: None,
            text_muted: None,
        },
        icon: None,
        description: None,
        effects: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Paint;

    #[test]
    fn test_builtin_ids_in_menu_order() {
        let ids: Vec<_> = builtin_themes().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["persona", "ninja", "pirate", "mech"]);
    }

    #[test]
    fn test_every_builtin_background_is_paintable() {
        for theme in builtin_themes() {
            assert!(
                Paint::parse(&theme.colors.background).is_some(),
                "{} background does not parse",
                theme.id
            );
        }
    }

    #[test]
    fn test_fallback_has_required_colors_only() {
        let theme = fallback_theme();
        assert!(theme.colors.surface.is_none());
        assert!(!theme.colors.background.is_empty());
    }
}
