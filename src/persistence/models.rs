//! Database row models.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Poll, PollOption, Vote};

/// Column tuple of the `polls` table.
pub type PollRow = (
    Uuid,
    String,
    Option<String>,
    Uuid,
    bool,
    bool,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// Column tuple of the `poll_options` table.
pub type OptionRow = (Uuid, Uuid, String, i32, DateTime<Utc>);

/// Column tuple of the `votes` table.
pub type VoteRow = (
    Uuid,
    Uuid,
    Uuid,
    Option<Uuid>,
    Option<String>,
    DateTime<Utc>,
);

/// Builds a poll from its row; options are attached separately.
#[must_use]
pub fn poll_from_row(row: PollRow) -> Poll {
    let (id, title, description, creator_id, is_public, allow_multiple_votes, expires_at, created_at, updated_at) =
        row;
    Poll {
        id: id.into(),
        title,
        description,
        creator_id: creator_id.into(),
        is_public,
        allow_multiple_votes,
        expires_at,
        created_at,
        updated_at,
        options: Vec::new(),
    }
}

/// Builds an option from its row. Vote counts are recomputed from votes.
#[must_use]
pub fn option_from_row(row: OptionRow) -> PollOption {
    let (id, poll_id, text, order_index, created_at) = row;
    PollOption {
        id: id.into(),
        poll_id: poll_id.into(),
        text,
        order_index: u32::try_from(order_index).unwrap_or_default(),
        created_at,
        vote_count: None,
    }
}

/// Builds a vote from its row.
#[must_use]
pub fn vote_from_row(row: VoteRow) -> Vote {
    let (id, poll_id, option_id, user_id, voter_ip, created_at) = row;
    Vote {
        id: id.into(),
        poll_id: poll_id.into(),
        option_id: option_id.into(),
        user_id: user_id.map(Into::into),
        voter_ip,
        created_at,
    }
}
