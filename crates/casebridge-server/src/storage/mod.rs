//! SQLite storage for the CaseBridge sync server.
//!
//! Provides the identity map (ticket id <-> case id correlation) and the
//! dead-letter table.

mod db;
mod dead_letter_sink;
mod models;
mod queries;
mod queries_dead_letter;

#[cfg(test)]
mod tests;

pub use db::SyncDatabase;
pub use dead_letter_sink::SqliteDeadLetterSink;
pub use models::{DeadLetterRow, IdentityMapping, MappingStatus};
