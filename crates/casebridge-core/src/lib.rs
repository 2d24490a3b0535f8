//! Core library for `CaseBridge`.
//!
//! Shared building blocks for the sync engine:
//! - `SyncEvent` model travelling on the event bus
//! - Error taxonomy (transient / permanent / consistency-gap / auth)
//! - Configuration resolution
//! - Secret store access with a process-scoped cache
//! - `SQLite` pool helpers and tracing initialization

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod secrets;
pub mod tracing_init;

pub use error::{Result, SyncError};
pub use events::{EventSource, SyncEvent};
