//! Common types and utilities shared across Radar crates.
//!
//! This crate defines the settings model, observability helpers, and shared
//! error types used throughout the Radar workspace. It stays lightweight so
//! every crate can depend on it without pulling in the fetch or parsing stack.
//!
//! # Overview
//!
//! - [`settings::RadarSettings`]: Top‑level pipeline settings (fetch, extract, preview, ingest)
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`RadarError`] and [`Result`]: Shared error handling
//! - [`StealthLevel`]: how hard the browser step tries to look like a person
//!
//! # Examples
//!
//! Constructing default settings:
//!
//! ```rust
//! use radar_common::{settings::RadarSettings, StealthLevel};
//!
//! let mut cfg = RadarSettings::default();
//! cfg.fetch.stealth_level = StealthLevel::Maximum;
//! assert_eq!(cfg.ingest.concurrency, 4);
//! assert_eq!(cfg.preview.with_image_limit, 1024);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;
pub mod settings;

/// Browser automation stealth level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

/// Errors surfaced to callers outside the pipeline crates.
#[derive(thiserror::Error, Debug)]
pub enum RadarError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every fetch strategy failed for the given URL.
    #[error("Fetch failed: {0}")]
    Fetch(String),
}

/// Convenient alias for results that use [`RadarError`].
pub type Result<T> = std::result::Result<T, RadarError>;
