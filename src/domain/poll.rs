//! Poll, option, and vote records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{OptionId, PollId, UserId, VoteId};

/// A question with an ordered set of options open for voting.
///
/// A poll exclusively owns its options. Only the creator may change the
/// title, description, expiry, or visibility after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Poll {
    /// Unique poll identifier (immutable after creation).
    pub id: PollId,
    /// Poll question.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// User who created the poll.
    pub creator_id: UserId,
    /// Private polls require an identified user to view or vote.
    pub is_public: bool,
    /// Whether an identified user may vote more than once.
    pub allow_multiple_votes: bool,
    /// Optional instant after which the poll no longer accepts votes.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to poll fields.
    pub updated_at: DateTime<Utc>,
    /// Options in display order.
    pub options: Vec<PollOption>,
}

impl Poll {
    /// Returns the option with the given identifier, if it belongs to
    /// this poll.
    #[must_use]
    pub fn option(&self, option_id: OptionId) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Sum of all option vote counts (absent counts are treated as zero).
    #[must_use]
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(PollOption::votes).sum()
    }

    /// Returns `true` if the given user created this poll.
    #[must_use]
    pub fn is_created_by(&self, user_id: UserId) -> bool {
        self.creator_id == user_id
    }
}

/// One selectable choice within a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PollOption {
    /// Unique option identifier.
    pub id: OptionId,
    /// Owning poll.
    pub poll_id: PollId,
    /// Option label.
    pub text: String,
    /// Display position, unique within the poll.
    pub order_index: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Number of votes recorded for this option. Derived from vote
    /// records, never authoritative on its own.
    #[serde(default)]
    pub vote_count: Option<u64>,
}

impl PollOption {
    /// Vote count, defaulting to zero when it has not been computed.
    #[must_use]
    pub fn votes(&self) -> u64 {
        self.vote_count.unwrap_or(0)
    }
}

/// A single recorded selection of an option.
///
/// Identified voters carry a `user_id`; anonymous voters carry the
/// network origin they voted from instead. The origin is never
/// serialized into API responses or broadcast events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vote {
    /// Unique vote identifier.
    pub id: VoteId,
    /// Poll the vote was cast in.
    pub poll_id: PollId,
    /// Selected option.
    pub option_id: OptionId,
    /// Identified voter, if any.
    pub user_id: Option<UserId>,
    /// Network origin of an anonymous voter.
    #[serde(skip_serializing, default)]
    pub voter_ip: Option<String>,
    /// Time the vote was recorded.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders shared by the domain and service tests.

    use chrono::{DateTime, Utc};

    use super::{Poll, PollOption};
    use crate::domain::{OptionId, PollId, UserId};

    /// Builds a public single-vote poll whose options carry the given
    /// vote counts.
    pub(crate) fn poll_with_counts(counts: &[u64]) -> Poll {
        let id = PollId::new();
        let now = Utc::now();
        let options = counts
            .iter()
            .enumerate()
            .map(|(i, count)| PollOption {
                id: OptionId::new(),
                poll_id: id,
                text: format!("Option {}", i + 1),
                order_index: u32::try_from(i).unwrap_or(u32::MAX),
                created_at: now,
                vote_count: Some(*count),
            })
            .collect();
        Poll {
            id,
            title: "Favourite language?".to_string(),
            description: None,
            creator_id: UserId::new(),
            is_public: true,
            allow_multiple_votes: false,
            expires_at: None,
            created_at: now,
            updated_at: now,
            options,
        }
    }

    /// Same as [`poll_with_counts`] with an expiry instant.
    pub(crate) fn poll_expiring_at(expires_at: DateTime<Utc>) -> Poll {
        let mut poll = poll_with_counts(&[0, 0]);
        poll.expires_at = Some(expires_at);
        poll
    }
}
