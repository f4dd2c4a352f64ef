//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams poll events and periodic
//! results snapshots for the polls a client subscribes to.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
