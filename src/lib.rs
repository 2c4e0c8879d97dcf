//! phantom-card
//!
//! A themeable resume page model with export to PNG, JPG, PDF and share
//! links.
//!
//! - [`page`] - The element tree exports and themes operate on
//! - [`theme`] - Theme registry, engine and switcher menu
//! - [`export`] - The export pipeline and delivery helpers
//! - [`config`] - User settings and theme persistence

pub mod config;
pub mod error;
pub mod export;
pub mod page;
pub mod theme;

pub use error::{Error, Result};
