//! Service layer: business logic orchestration.
//!
//! [`PollService`] enforces the poll rules, mutates the
//! [`super::domain::PollStore`], and emits events through the
//! [`super::domain::EventBus`].

pub mod poll_service;

pub use poll_service::{PollPage, PollService, ServiceOptions, Voter};
