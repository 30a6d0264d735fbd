// src/config/mod.rs

//! Configuration for a watch session.
//!
//! A [`Config`] is assembled from two sources:
//! - an optional TOML file ([`loader`]),
//! - CLI flags, which are merged on top in [`Config::from_args`].
//!
//! Once built and validated it is immutable for the session's lifetime; the
//! rest of the crate only reads it.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_from_path};
pub use model::{Config, ConfigFileModel, DEFAULT_DEBOUNCE_MS};
pub use validate::validate_config;
