//! CaseBridge Sync Server Library
//!
//! Bidirectional synchronization between a helpdesk ticketing system and a
//! cloud provider's support-case API:
//! - SQLite identity map and dead-letter storage
//! - Bearer-token webhook authentication
//! - Outbound REST clients for both platforms
//! - Event handlers for each sync direction
//! - Axum webhook ingress feeding the event bus

pub mod auth;
pub mod clients;
pub mod handlers;
pub mod storage;
pub mod webhook;
