//! Per-option vote counts and percentage shares.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::lifecycle::{self, PollStatus};
use super::{OptionId, Poll, PollId, UserId};

/// Computed result for a single option.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OptionResult {
    /// Option identifier.
    pub option_id: OptionId,
    /// Option label.
    pub text: String,
    /// Display position.
    pub order_index: u32,
    /// Vote count (zero when the option carries no count).
    pub votes: u64,
    /// Share of the poll's total votes, 0–100, two decimal places.
    pub percentage: f64,
}

/// Rounds to two decimal places, halves away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns `part / total * 100`, or zero when `total` is zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn share_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// [`share_of`] rounded to two decimals.
pub(crate) fn percentage(part: u64, total: u64) -> f64 {
    round2(share_of(part, total))
}

/// Computes vote counts and percentage shares for every option of `poll`,
/// preserving option order.
///
/// Returns an empty vector when the poll has no options. When the poll has
/// no votes at all, every percentage is zero.
#[must_use]
pub fn calculate_poll_results(poll: &Poll) -> Vec<OptionResult> {
    let total = poll.total_votes();
    poll.options
        .iter()
        .map(|option| {
            let votes = option.votes();
            OptionResult {
                option_id: option.id,
                text: option.text.clone(),
                order_index: option.order_index,
                votes,
                percentage: percentage(votes, total),
            }
        })
        .collect()
}

/// Results snapshot of a poll as seen by one viewer at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PollResults {
    /// Poll identifier.
    pub poll_id: PollId,
    /// Poll question.
    pub title: String,
    /// Status at `computed_at`.
    pub status: PollStatus,
    /// Total votes across all options.
    pub total_votes: u64,
    /// Whether the viewer may currently vote (prior votes not considered).
    pub can_vote: bool,
    /// Human-readable remaining time, `"Expired"`, or absent when the poll
    /// never expires.
    pub time_until_expiry: Option<String>,
    /// Per-option results in display order.
    pub options: Vec<OptionResult>,
    /// Evaluation instant.
    pub computed_at: DateTime<Utc>,
}

impl PollResults {
    /// Builds the results snapshot for `viewer` at `now`.
    #[must_use]
    pub fn compute(poll: &Poll, viewer: Option<UserId>, now: DateTime<Utc>) -> Self {
        Self {
            poll_id: poll.id,
            title: poll.title.clone(),
            status: lifecycle::poll_status(poll, now),
            total_votes: poll.total_votes(),
            can_vote: lifecycle::can_user_vote(poll, viewer, now),
            time_until_expiry: lifecycle::time_until_expiry(poll, now),
            options: calculate_poll_results(poll),
            computed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::poll::fixtures::poll_with_counts;

    fn percentages(counts: &[u64]) -> Vec<f64> {
        calculate_poll_results(&poll_with_counts(counts))
            .into_iter()
            .map(|r| r.percentage)
            .collect()
    }

    #[test]
    fn splits_five_ten_five_into_quarters() {
        assert_eq!(percentages(&[5, 10, 5]), vec![25.0, 50.0, 25.0]);
    }

    #[test]
    fn zero_votes_give_zero_percentages() {
        assert_eq!(percentages(&[0, 0]), vec![0.0, 0.0]);
    }

    #[test]
    fn no_options_gives_empty_results() {
        assert!(percentages(&[]).is_empty());
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        for counts in [&[1u64, 1, 1][..], &[2, 3, 7, 11], &[45, 38, 32, 15, 12], &[1, 0]] {
            let sum: f64 = percentages(counts).iter().sum();
            assert!((sum - 100.0).abs() < 0.05, "{counts:?} summed to {sum}");
        }
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(percentages(&[1, 2]), vec![33.33, 66.67]);
    }

    #[test]
    fn missing_counts_default_to_zero() {
        let mut poll = poll_with_counts(&[4, 4]);
        if let Some(first) = poll.options.first_mut() {
            first.vote_count = None;
        }
        let results = calculate_poll_results(&poll);
        let votes: Vec<u64> = results.iter().map(|r| r.votes).collect();
        assert_eq!(votes, vec![0, 4]);
        assert_eq!(results.last().map(|r| r.percentage), Some(100.0));
    }

    #[test]
    fn snapshot_reports_status_and_totals() {
        let poll = poll_with_counts(&[2, 6]);
        let results = PollResults::compute(&poll, None, Utc::now());
        assert_eq!(results.status, PollStatus::Active);
        assert_eq!(results.total_votes, 8);
        assert!(results.can_vote);
        assert!(results.time_until_expiry.is_none());
        assert_eq!(results.options.len(), 2);
    }
}
