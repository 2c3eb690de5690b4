//! Portal Configuration Module
//!
//! Provides deployment configuration loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `NEWS_FEEDBACK_CONFIG` environment variable (path to TOML file)
//! 2. `news_feedback.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded config is passed explicitly to the components that need it
//! (store construction, submission settings, API state); there is no global.

mod portal_config;
pub mod defaults;
pub mod validation;

pub use portal_config::*;
