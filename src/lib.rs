//! # quickpoll
//!
//! REST API and WebSocket service for creating polls, collecting votes,
//! and following results live.
//!
//! Poll rules (results, expiry, option cleaning, analytics, share links)
//! are pure functions in [`domain`]; request payloads are checked by the
//! schemas in [`validation`]; [`service::PollService`] runs the poll
//! lifecycle against an in-memory store and broadcasts every change.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── Schemas (validation/)
//!     ├── PollService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── PollStore + pure poll rules (domain/)
//!     │
//!     └── PostgreSQL mirror (persistence/, optional)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod validation;
pub mod ws;
