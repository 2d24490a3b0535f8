//! The two sync handlers consuming events from the bus.
//!
//! Both are invoked at-least-once per event and rely exclusively on the
//! identity map's conditional writes for correctness under concurrent
//! duplicate deliveries; neither holds any in-process lock across
//! invocations.

mod cloud_to_helpdesk;
mod helpdesk_to_cloud;

#[cfg(test)]
mod tests;

pub use cloud_to_helpdesk::CloudToHelpdeskHandler;
pub use helpdesk_to_cloud::HelpdeskToCloudHandler;
