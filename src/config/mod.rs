//! Configuration module for phantom-card
//!
//! This module handles user preferences and the persisted theme selection,
//! including serialization/deserialization to/from JSON and persistent
//! storage to platform-specific directories.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
