//! Domain events reflecting poll state mutations.
//!
//! Every mutation emits a [`PollEvent`] through the [`super::EventBus`].
//! Events are what WebSocket subscribers see, so they carry nothing about
//! who voted: no user id, no network origin.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{OptionId, Poll, PollId, UserId, VoteId};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PollEvent {
    /// Emitted when a new poll is created.
    PollCreated {
        /// Full poll as created, options included.
        poll: Poll,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after the creator edits a poll.
    PollUpdated {
        /// Poll after the update.
        poll: Poll,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a poll is deleted.
    PollDeleted {
        /// Poll identifier.
        poll_id: PollId,
        /// Creator of the deleted poll.
        creator_id: UserId,
        /// Visibility of the poll at deletion time.
        is_public: bool,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a vote is recorded.
    VoteCast {
        /// Poll the vote was cast in.
        poll_id: PollId,
        /// Chosen option.
        option_id: OptionId,
        /// Identifier of the recorded vote.
        vote_id: VoteId,
        /// Creator of the poll.
        creator_id: UserId,
        /// Visibility of the poll the vote was cast in.
        is_public: bool,
        /// Poll total after this vote.
        total_votes: u64,
        /// Recording timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl PollEvent {
    /// Returns the poll ID associated with this event.
    #[must_use]
    pub fn poll_id(&self) -> PollId {
        match self {
            Self::PollCreated { poll, .. } | Self::PollUpdated { poll, .. } => poll.id,
            Self::PollDeleted { poll_id, .. } | Self::VoteCast { poll_id, .. } => *poll_id,
        }
    }

    /// Returns the creator of the affected poll.
    #[must_use]
    pub fn creator_id(&self) -> UserId {
        match self {
            Self::PollCreated { poll, .. } | Self::PollUpdated { poll, .. } => poll.creator_id,
            Self::PollDeleted { creator_id, .. } | Self::VoteCast { creator_id, .. } => *creator_id,
        }
    }

    /// Returns `true` if the affected poll is public.
    #[must_use]
    pub fn is_public(&self) -> bool {
        match self {
            Self::PollCreated { poll, .. } | Self::PollUpdated { poll, .. } => poll.is_public,
            Self::PollDeleted { is_public, .. } | Self::VoteCast { is_public, .. } => *is_public,
        }
    }

    /// Returns `true` if `viewer` may receive this event.
    ///
    /// Public poll events go to everyone; private ones only to the creator.
    #[must_use]
    pub fn is_visible_to(&self, viewer: Option<UserId>) -> bool {
        self.is_public() || viewer == Some(self.creator_id())
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PollCreated { .. } => "poll_created",
            Self::PollUpdated { .. } => "poll_updated",
            Self::PollDeleted { .. } => "poll_deleted",
            Self::VoteCast { .. } => "vote_cast",
        }
    }
}
