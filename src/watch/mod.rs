// src/watch/mod.rs

//! File watching and change coalescing.
//!
//! This module is responsible for:
//! - Deciding which changed paths are relevant ([`filter`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) ([`monitor`]).
//! - Collapsing bursts of changes into single restart triggers ([`debounce`]).
//!
//! It does **not** know about managed processes; it only turns filesystem
//! noise into one coalesced "something relevant changed" signal at a time.

pub mod debounce;
pub mod filter;
pub mod monitor;

pub use debounce::Debouncer;
pub use filter::PathFilter;
pub use monitor::{MonitorEvent, MonitorHandle, spawn_monitor};
