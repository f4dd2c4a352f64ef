//! Data Transfer Objects for REST response serialization.
//!
//! Request payloads are the schemas in [`crate::validation`]; the types
//! here shape what handlers send back.

pub mod common_dto;
pub mod poll_dto;
pub mod vote_dto;

pub use common_dto::*;
pub use poll_dto::*;
pub use vote_dto::*;
