//! Vote DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Vote;

/// Message sent back after a vote is recorded.
pub const VOTE_RECORDED_MESSAGE: &str = "Vote recorded successfully";

/// Response body for `POST /polls/{id}/vote` (201 Created).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VoteResponse {
    /// Human-readable outcome.
    pub message: String,
    /// The stored vote.
    pub vote: Vote,
}

impl VoteResponse {
    /// Wraps a freshly recorded vote.
    #[must_use]
    pub fn recorded(vote: Vote) -> Self {
        Self {
            message: VOTE_RECORDED_MESSAGE.to_string(),
            vote,
        }
    }
}
