//! Poll DTOs for create, get, update, and list operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::lifecycle::{poll_status, time_until_expiry};
use crate::domain::options::sort_poll_options;
use crate::domain::{
    Poll, PollAnalytics, PollId, PollOption, PollStatus, PollSummaryStats, UserId,
};

/// Full poll representation with options and counts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollDto {
    /// Poll identifier.
    pub id: PollId,
    /// Question text.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Creator's user id.
    pub creator_id: UserId,
    /// Whether the poll is listed publicly.
    pub is_public: bool,
    /// Whether a voter may vote more than once.
    pub allow_multiple_votes: bool,
    /// Expiry instant, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Status at response time.
    pub status: PollStatus,
    /// Sum of option vote counts.
    pub total_votes: u64,
    /// Remaining time, `"Expired"`, or absent when the poll never expires.
    pub time_until_expiry: Option<String>,
    /// Options in display order.
    pub options: Vec<PollOption>,
}

impl PollDto {
    /// Builds the response view of `poll` as of `now`.
    #[must_use]
    pub fn from_poll(poll: &Poll, now: DateTime<Utc>) -> Self {
        Self {
            id: poll.id,
            title: poll.title.clone(),
            description: poll.description.clone(),
            creator_id: poll.creator_id,
            is_public: poll.is_public,
            allow_multiple_votes: poll.allow_multiple_votes,
            expires_at: poll.expires_at,
            created_at: poll.created_at,
            updated_at: poll.updated_at,
            status: poll_status(poll, now),
            total_votes: poll.total_votes(),
            time_until_expiry: time_until_expiry(poll, now),
            options: sort_poll_options(&poll.options),
        }
    }
}

/// Envelope for single-poll responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollResponse {
    /// The poll.
    pub poll: PollDto,
}

/// Poll summary for list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollSummaryDto {
    /// Poll identifier.
    pub id: PollId,
    /// Question text.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Whether the poll is listed publicly.
    pub is_public: bool,
    /// Whether a voter may vote more than once.
    pub allow_multiple_votes: bool,
    /// Expiry instant, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Status at response time.
    pub status: PollStatus,
    /// Sum of option vote counts.
    pub total_votes: u64,
    /// Number of options.
    pub option_count: usize,
}

impl PollSummaryDto {
    /// Builds the list view of `poll` as of `now`.
    #[must_use]
    pub fn from_poll(poll: &Poll, now: DateTime<Utc>) -> Self {
        Self {
            id: poll.id,
            title: poll.title.clone(),
            description: poll.description.clone(),
            is_public: poll.is_public,
            allow_multiple_votes: poll.allow_multiple_votes,
            expires_at: poll.expires_at,
            created_at: poll.created_at,
            status: poll_status(poll, now),
            total_votes: poll.total_votes(),
            option_count: poll.options.len(),
        }
    }
}

/// Paginated list response for `GET /polls`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollListResponse {
    /// Polls on this page.
    pub polls: Vec<PollSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `GET /polls/{id}/analytics`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    /// Stored counters maintained on every vote.
    pub analytics: PollAnalytics,
    /// Summary derived from current option counts.
    pub summary: PollSummaryStats,
}
