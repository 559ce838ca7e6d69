// src/watch/mod.rs

//! File watching.
//!
//! - [`patterns`] compiles the `[watch]` globs (plus the pipeline's own
//!   outputs as implicit excludes).
//! - [`watcher`] bridges `notify` into the runtime channel.
//!
//! This module does not rebuild anything; it only turns filesystem changes
//! into `RuntimeEvent::FilesChanged`. Debouncing and serialization live in
//! `engine::runtime`.

pub mod patterns;
pub mod watcher;

pub use patterns::WatchProfile;
pub use watcher::{WatcherHandle, spawn_watcher};
