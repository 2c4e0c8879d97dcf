//! Keyboard navigation for the theme switcher menu

use super::ThemeEngine;
use crate::page::Document;
use log::debug;

/// Keys the theme menu reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Space,
    Escape,
}

impl MenuKey {
    /// Map a DOM-style key name (`ArrowUp`, `Enter`, `" "`, ...) to a menu key.
    pub fn from_name(name: &str) -> Option<MenuKey> {
        match name {
            "ArrowUp" | "Up" | "up" => Some(MenuKey::Up),
            "ArrowDown" | "Down" | "down" => Some(MenuKey::Down),
            "ArrowLeft" | "Left" | "left" => Some(MenuKey::Left),
            "ArrowRight" | "Right" | "right" => Some(MenuKey::Right),
            "Enter" | "enter" => Some(MenuKey::Enter),
            " " | "Space" | "space" => Some(MenuKey::Space),
            "Escape" | "Esc" | "escape" | "esc" => Some(MenuKey::Escape),
            _ => None,
        }
    }
}

/// Open/closed state and highlighted entry of the theme menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeMenu {
    open: bool,
    index: usize,
}

impl ThemeMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Index of the highlighted theme in registry order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Open the menu with the committed theme highlighted.
    pub fn open(&mut self, engine: &ThemeEngine) {
        self.open = true;
        self.index = engine
            .registry()
            .index_of(engine.current_theme_id())
            .unwrap_or(0);
    }

    /// Close the menu, dropping any preview.
    pub fn close(&mut self, engine: &mut ThemeEngine, document: &mut Document) {
        self.open = false;
        engine.clear_preview(document);
    }

    /// Handle one key press. Returns whether the key was consumed.
    ///
    /// Arrows wrap around the catalog and preview the highlighted theme;
    /// Enter/Space opens a closed menu or commits the highlighted theme;
    /// Escape closes without changing the committed theme.
    pub fn handle_key(
        &mut self,
        key: MenuKey,
        engine: &mut ThemeEngine,
        document: &mut Document,
    ) -> bool {
        if !self.open {
            return match key {
                MenuKey::Enter | MenuKey::Space => {
                    self.open(engine);
                    true
                }
                _ => false,
            };
        }

        let len = engine.registry().len();
        match key {
            MenuKey::Up | MenuKey::Left => {
                self.index = (self.index + len - 1) % len.max(1);
                self.preview_highlighted(engine, document);
            }
            MenuKey::Down | MenuKey::Right => {
                self.index = (self.index + 1) % len.max(1);
                self.preview_highlighted(engine, document);
            }
            MenuKey::Enter | MenuKey::Space => {
                if let Some(theme) = engine.registry().all().get(self.index) {
                    let id = theme.id.clone();
                    engine.set_theme(document, &id);
                }
                self.open = false;
            }
            MenuKey::Escape => self.close(engine, document),
        }
        true
    }

    fn preview_highlighted(&self, engine: &mut ThemeEngine, document: &mut Document) {
        let Some(theme) = engine.registry().all().get(self.index) else {
            return;
        };
        let id = theme.id.clone();
        debug!("Theme menu highlight: {} ({})", id, self.index);
        if !engine.preview(document, &id) {
            // Back on the committed theme
            engine.clear_preview(document);
        }
    }
}
