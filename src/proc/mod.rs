// src/proc/mod.rs

//! Managed process lifecycle.
//!
//! - [`group`] is the platform primitive for terminating a whole process
//!   group (a command plus everything it forked).
//! - [`handle`] owns one command's spawn/stop/restart state machine.
//! - [`supervisor`] drives the ordered collection of handles for a session.
//!
//! Handles are only ever touched through the supervisor's entry points, which
//! the session serializes; no per-handle locking is needed.

pub mod group;
pub mod handle;
pub mod supervisor;

pub use group::GroupSignal;
pub use handle::{HandleState, ProcessHandle};
pub use supervisor::Supervisor;
