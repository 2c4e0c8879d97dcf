//! Theme Engine for phantom-card
//!
//! This module provides centralized theme management: picking the active
//! theme on load, switching themes, transient previews, persistence of the
//! selection, and change notification.
//!
//! # Usage
//!
//! ```ignore
//! let mut engine = ThemeEngine::new(ThemeRegistry::builtin(), Box::new(storage));
//! engine.initialize(&mut document);
//!
//! engine.preview(&mut document, "mech");   // hover
//! engine.clear_preview(&mut document);     // pointer leave
//! engine.set_theme(&mut document, "ninja"); // click
//! ```

use log::{debug, info, warn};

use super::apply::{apply_preview, apply_theme};
use super::{Theme, ThemeRegistry};
use crate::config::ThemeStorage;
use crate::page::Document;

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of the active theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeState {
    /// Nothing applied yet
    Uninitialized,
    /// Writing the theme's variables onto the page
    Applying(String),
    /// A theme is applied and persisted
    Idle(String),
    /// A preview is shown on top of the committed theme; never persisted
    Previewing { committed: String, preview: String },
}

impl ThemeState {
    /// The id that is (or is about to be) committed.
    pub fn committed_id(&self) -> Option<&str> {
        match self {
            ThemeState::Uninitialized => None,
            ThemeState::Applying(id) | ThemeState::Idle(id) => Some(id),
            ThemeState::Previewing { committed, .. } => Some(committed),
        }
    }
}

/// A state transition delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEvent {
    pub previous: ThemeState,
    pub current: ThemeState,
}

/// Handle returned by [`ThemeEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&ThemeEvent)>;

// ─────────────────────────────────────────────────────────────────────────────
// Theme Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the theme catalog, the persisted selection and the current state.
///
/// Only one theme is current at a time. Applying performs several page
/// writes in sequence but is atomic from the caller's point of view, as
/// everything runs on the caller's thread.
pub struct ThemeEngine {
    registry: ThemeRegistry,
    storage: Box<dyn ThemeStorage>,
    state: ThemeState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl ThemeEngine {
    pub fn new(registry: ThemeRegistry, storage: Box<dyn ThemeStorage>) -> Self {
        info!(
            "ThemeEngine created with {} themes (default \"{}\")",
            registry.len(),
            registry.default_id()
        );
        Self {
            registry,
            storage,
            state: ThemeState::Uninitialized,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn registry(&self) -> &ThemeRegistry {
        &self.registry
    }

    pub fn state(&self) -> &ThemeState {
        &self.state
    }

    /// The committed theme, or the default before initialization.
    pub fn current_theme(&self) -> &Theme {
        self.registry.resolve(self.state.committed_id())
    }

    pub fn current_theme_id(&self) -> &str {
        &self.current_theme().id
    }

    /// Read the persisted selection and apply it.
    ///
    /// A missing or unrecognized stored id resolves to the default theme.
    pub fn initialize(&mut self, document: &mut Document) {
        let stored = self.storage.load();
        let theme_id = self.registry.resolve(stored.as_deref()).id.clone();
        if stored.as_deref() != Some(theme_id.as_str()) {
            debug!(
                "Stored theme {:?} not usable, falling back to \"{}\"",
                stored, theme_id
            );
        }

        self.apply(document, &theme_id, false);
        if let Some(body) = document.body_mut() {
            body.add_class("theme-enhanced");
        }
        info!("Theme initialized: {}", theme_id);
    }

    /// Select a theme. Unknown ids resolve to the default theme.
    ///
    /// Selecting the committed theme is a no-op: no page writes, no storage
    /// write, no event. Returns whether a new theme was applied.
    pub fn set_theme(&mut self, document: &mut Document, theme_id: &str) -> bool {
        let resolved = self.registry.resolve(Some(theme_id)).id.clone();
        if resolved != theme_id {
            warn!("Theme \"{}\" not found, using \"{}\"", theme_id, resolved);
        }

        // A preview always settles back to idle before anything is applied.
        if matches!(self.state, ThemeState::Previewing { .. }) {
            self.clear_preview(document);
        }
        if self.state.committed_id() == Some(resolved.as_str()) {
            return false;
        }

        info!(
            "Theme changed from {:?} to \"{}\"",
            self.state.committed_id(),
            resolved
        );
        self.apply(document, &resolved, true);
        true
    }

    /// Show a theme's primary and accent colors without committing it.
    ///
    /// Only allowed when a different theme is committed. Returns whether a
    /// preview is now showing.
    pub fn preview(&mut self, document: &mut Document, theme_id: &str) -> bool {
        if matches!(self.state, ThemeState::Previewing { .. }) {
            self.clear_preview(document);
        }
        let ThemeState::Idle(committed) = &self.state else {
            return false;
        };
        if committed == theme_id {
            return false;
        }
        let Some(theme) = self.registry.get(theme_id) else {
            return false;
        };

        apply_preview(document, theme);
        let next = ThemeState::Previewing {
            committed: committed.clone(),
            preview: theme_id.to_string(),
        };
        self.transition(next);
        true
    }

    /// Re-apply the committed theme's full variable set and return to idle.
    pub fn clear_preview(&mut self, document: &mut Document) {
        let ThemeState::Previewing { committed, .. } = &self.state else {
            return;
        };
        let committed = committed.clone();
        if let Some(theme) = self.registry.get(&committed) {
            apply_theme(document, theme);
        }
        self.transition(ThemeState::Idle(committed));
    }

    /// Move `offset` places through the catalog from the committed theme,
    /// wrapping around, and select that theme.
    pub fn cycle(&mut self, document: &mut Document, offset: isize) -> bool {
        let len = self.registry.len() as isize;
        if len == 0 {
            return false;
        }
        let current = self
            .registry
            .index_of(self.current_theme_id())
            .unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(len) as usize;
        let id = self.registry.all()[next].id.clone();
        self.set_theme(document, &id)
    }

    /// Register a callback for state transitions.
    pub fn subscribe(&mut self, callback: impl FnMut(&ThemeEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    fn apply(&mut self, document: &mut Document, theme_id: &str, persist: bool) {
        self.transition(ThemeState::Applying(theme_id.to_string()));

        if let Some(theme) = self.registry.get(theme_id) {
            apply_theme(document, theme);
        }
        if persist {
            if let Err(e) = self.storage.save(theme_id) {
                warn!("Failed to persist theme \"{}\": {}", theme_id, e);
            }
        }

        self.transition(ThemeState::Idle(theme_id.to_string()));
    }

    fn transition(&mut self, next: ThemeState) {
        let previous = std::mem::replace(&mut self.state, next.clone());
        debug!("Theme state {:?} -> {:?}", previous, next);
        let event = ThemeEvent {
            previous,
            current: next,
        };
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&event);
        }
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("state", &self.state)
            .field("themes", &self.registry.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
