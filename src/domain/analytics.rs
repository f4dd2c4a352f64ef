//! Derived poll analytics.
//!
//! Nothing here is authoritative: [`PollAnalytics`] is recomputed from the
//! vote records after every vote, and [`PollSummaryStats`] is derived from
//! the option counts on demand.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::results::{round2, share_of};
use super::{Poll, PollId, Vote};

/// Aggregate vote counts for a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PollAnalytics {
    /// Poll the analytics belong to.
    pub poll_id: PollId,
    /// Number of vote records.
    pub total_votes: u64,
    /// Distinct identified users plus distinct anonymous origins.
    pub unique_voters: u64,
    /// Time of the most recent vote.
    pub last_vote_at: Option<DateTime<Utc>>,
    /// Time these analytics were computed.
    pub updated_at: DateTime<Utc>,
}

impl PollAnalytics {
    /// Analytics for a poll without votes.
    #[must_use]
    pub fn empty(poll_id: PollId, now: DateTime<Utc>) -> Self {
        Self {
            poll_id,
            total_votes: 0,
            unique_voters: 0,
            last_vote_at: None,
            updated_at: now,
        }
    }

    /// Recomputes analytics from the full set of vote records of a poll.
    #[must_use]
    pub fn from_votes(poll_id: PollId, votes: &[Vote], now: DateTime<Utc>) -> Self {
        let mut users = HashSet::new();
        let mut origins = HashSet::new();
        for vote in votes {
            match (vote.user_id, vote.voter_ip.as_deref()) {
                (Some(user_id), _) => {
                    users.insert(user_id);
                }
                (None, origin) => {
                    origins.insert(origin.unwrap_or("unknown"));
                }
            }
        }

        Self {
            poll_id,
            total_votes: votes.len() as u64,
            unique_voters: (users.len() + origins.len()) as u64,
            last_vote_at: votes.iter().map(|v| v.created_at).max(),
            updated_at: now,
        }
    }
}

/// The option with the most votes.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MostPopular {
    /// Option label.
    pub text: String,
    /// Votes for the option.
    pub votes: u64,
    /// Share of total votes in percent, unrounded.
    pub percentage: f64,
}

/// Engagement summary derived from option counts.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PollSummaryStats {
    /// Total votes across all options.
    pub total_votes: u64,
    /// Number of options.
    pub total_options: usize,
    /// Leading option; the earliest option wins ties.
    pub most_popular: Option<MostPopular>,
    /// Mean votes per option, two decimal places.
    pub average_votes_per_option: f64,
    /// `total / (total + 100) * 100`, two decimal places.
    pub engagement_rate: f64,
}

/// Summarizes the poll's option counts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_poll(poll: &Poll) -> PollSummaryStats {
    let total_votes = poll.total_votes();
    let total_options = poll.options.len();

    let most_popular = poll
        .options
        .iter()
        .reduce(|best, current| {
            if current.votes() > best.votes() {
                current
            } else {
                best
            }
        })
        .map(|option| MostPopular {
            text: option.text.clone(),
            votes: option.votes(),
            percentage: share_of(option.votes(), total_votes),
        });

    let average_votes_per_option = if total_options == 0 {
        0.0
    } else {
        round2(total_votes as f64 / total_options as f64)
    };

    let engagement_rate = if total_votes == 0 {
        0.0
    } else {
        round2(total_votes as f64 / (total_votes as f64 + 100.0) * 100.0)
    };

    PollSummaryStats {
        total_votes,
        total_options,
        most_popular,
        average_votes_per_option,
        engagement_rate,
    }
}
