//! In-memory per-session conversation history.
//!
//! Sessions are keyed by an opaque caller-supplied id, hold a bounded
//! window of conversation turns, and expire after a fixed idle period via
//! a background sweep task.

pub mod store;
pub mod sweeper;

pub use {
    store::{Role, SessionSnapshot, SessionStore, StoreLimits, Turn},
    sweeper::{SweeperHandle, spawn_sweeper},
};
