//! In-process event bus for CaseBridge.
//!
//! Decouples the webhook ingress (producer) from the sync handlers
//! (consumers). Each subscription gets its own bounded queue and worker
//! task; a failing handler invocation is redelivered with exponential
//! backoff up to a configured attempt cap, after which the event is
//! diverted to the dead-letter sink.
//!
//! Delivery semantics: at-least-once, unordered across subscribers.
//! Handlers must tolerate duplicate invocations for the same event.

pub mod bus;
pub mod dead_letter;
pub mod handler;

pub use bus::{BusConfig, EventBus, PublishError};
pub use dead_letter::{DeadLetter, DeadLetterSink, MemoryDeadLetterSink};
pub use handler::EventHandler;
