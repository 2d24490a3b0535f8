//! Consumer-side trait for the event bus.

use async_trait::async_trait;

use casebridge_core::{SyncError, SyncEvent};

/// A subscriber invoked once per delivered event.
///
/// The bus may invoke a handler more than once for the same event
/// (redelivery after failure, duplicate publishes); implementations must be
/// idempotent. Handlers never retry internally -- they classify the failure
/// and return it, redelivery belongs to the bus.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable handler name, used in logs and dead-letter records.
    fn name(&self) -> &'static str;

    /// Process one event.
    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError>;
}
