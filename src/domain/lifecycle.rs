//! Poll expiry and status evaluation.
//!
//! Status is never cached: every function takes the evaluation instant
//! explicitly, so the same poll can report `active` on one call and
//! `expired` on a later one without any data changing.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Poll, UserId};

/// Lifecycle state of a poll at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    /// The poll accepts votes.
    Active,
    /// The expiry instant has passed.
    Expired,
}

impl PollStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

/// Returns `true` iff the poll has an expiry instant strictly before `now`.
#[must_use]
pub fn is_poll_expired(poll: &Poll, now: DateTime<Utc>) -> bool {
    poll.expires_at.is_some_and(|expires_at| expires_at < now)
}

/// Inverse of [`is_poll_expired`].
#[must_use]
pub fn is_poll_active(poll: &Poll, now: DateTime<Utc>) -> bool {
    !is_poll_expired(poll, now)
}

/// Classifies the poll as [`PollStatus::Active`] or [`PollStatus::Expired`].
#[must_use]
pub fn poll_status(poll: &Poll, now: DateTime<Utc>) -> PollStatus {
    if is_poll_expired(poll, now) {
        PollStatus::Expired
    } else {
        PollStatus::Active
    }
}

/// Returns whether `user` may vote on `poll` at `now`.
///
/// Expired polls reject everyone; private polls reject anonymous voters.
/// Prior votes are not considered here.
#[must_use]
pub fn can_user_vote(poll: &Poll, user: Option<UserId>, now: DateTime<Utc>) -> bool {
    if is_poll_expired(poll, now) {
        return false;
    }
    poll.is_public || user.is_some()
}

/// Describes the time left before the poll expires using its largest
/// whole unit (`"2 days"`, `"1 hour"`, `"15 minutes"`).
///
/// Returns `None` for polls without expiry and `"Expired"` once no time
/// remains.
#[must_use]
pub fn time_until_expiry(poll: &Poll, now: DateTime<Utc>) -> Option<String> {
    let expires_at = poll.expires_at?;
    let remaining = expires_at - now;
    if remaining <= TimeDelta::zero() {
        return Some("Expired".to_string());
    }

    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;

    let text = if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else {
        plural(minutes, "minute")
    };
    Some(text)
}

/// Only counts above one take the plural suffix, so under a minute reads
/// `"0 minute"`.
fn plural(n: i64, unit: &str) -> String {
    if n > 1 {
        format!("{n} {unit}s")
    } else {
        format!("{n} {unit}")
    }
}
