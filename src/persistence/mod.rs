//! Persistence layer: PostgreSQL mirror of polls, votes, and the event log.
//!
//! The in-memory [`crate::domain::PollStore`] stays authoritative while
//! the service runs. When enabled, [`writer::spawn_journal_writer`] drains
//! the bounded change journal into PostgreSQL, and startup restores the
//! store from the tables.

pub mod models;
pub mod postgres;
pub mod writer;

pub use postgres::PostgresPersistence;
pub use writer::spawn_journal_writer;
