//! Concurrent poll storage with per-poll fine-grained locking.
//!
//! [`PollStore`] keeps every poll in a `HashMap` where each record is
//! individually protected by a [`tokio::sync::RwLock`]. Reads of the same
//! poll run concurrently, writes to different polls run concurrently, and
//! writes to one poll are serialized. Vote admission (duplicate check plus
//! insert) happens while holding a single poll's write lock, so two
//! concurrent votes from the same user cannot both pass the check.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::{OptionId, Poll, PollAnalytics, PollId, UserId, Vote};
use crate::error::PollError;

/// A poll together with its vote records and derived analytics.
#[derive(Debug, Clone)]
pub struct PollRecord {
    /// The poll; option `vote_count`s mirror `votes`.
    pub poll: Poll,
    /// Every vote cast in this poll, oldest first.
    pub votes: Vec<Vote>,
    /// Analytics recomputed after each vote.
    pub analytics: PollAnalytics,
    /// Set once the poll is deleted; holders of a stale handle must not
    /// mutate it.
    pub removed: bool,
}

impl PollRecord {
    /// Wraps a freshly created poll with zero votes.
    #[must_use]
    pub fn new(poll: Poll, now: DateTime<Utc>) -> Self {
        Self::with_votes(poll, Vec::new(), now)
    }

    /// Wraps a poll with existing votes, recomputing counts and analytics.
    #[must_use]
    pub fn with_votes(poll: Poll, votes: Vec<Vote>, now: DateTime<Utc>) -> Self {
        let analytics = PollAnalytics::from_votes(poll.id, &votes, now);
        let mut record = Self {
            poll,
            votes,
            analytics,
            removed: false,
        };
        record.recount();
        record
    }

    /// Returns `true` if `user_id` already voted in this poll.
    #[must_use]
    pub fn has_user_voted(&self, user_id: UserId) -> bool {
        self.votes.iter().any(|v| v.user_id == Some(user_id))
    }

    /// Returns `true` if an anonymous vote from `origin` exists.
    #[must_use]
    pub fn has_origin_voted(&self, origin: &str) -> bool {
        self.votes
            .iter()
            .any(|v| v.user_id.is_none() && v.voter_ip.as_deref() == Some(origin))
    }

    /// Appends a vote, bumps its option count, and refreshes analytics.
    pub fn push_vote(&mut self, vote: Vote, now: DateTime<Utc>) {
        if let Some(option) = self.poll.options.iter_mut().find(|o| o.id == vote.option_id) {
            option.vote_count = Some(option.votes().saturating_add(1));
        }
        self.votes.push(vote);
        self.analytics = PollAnalytics::from_votes(self.poll.id, &self.votes, now);
    }

    fn recount(&mut self) {
        let mut counts: HashMap<OptionId, u64> = HashMap::new();
        for vote in &self.votes {
            *counts.entry(vote.option_id).or_default() += 1;
        }
        for option in &mut self.poll.options {
            option.vote_count = Some(counts.get(&option.id).copied().unwrap_or(0));
        }
    }
}

/// Central store for all polls.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-poll
/// `Arc<RwLock<PollRecord>>` for fine-grained locking.
#[derive(Debug, Default)]
pub struct PollStore {
    polls: RwLock<HashMap<PollId, Arc<RwLock<PollRecord>>>>,
}

impl PollStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new poll record and returns it write-locked, so the
    /// caller can announce the poll before anyone else touches it.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Internal`] if a poll with the same ID already
    /// exists (should never happen with UUID v4).
    pub async fn insert(
        &self,
        record: PollRecord,
    ) -> Result<OwnedRwLockWriteGuard<PollRecord>, PollError> {
        let poll_id = record.poll.id;
        let entry = Arc::new(RwLock::new(record));
        let guard = Arc::clone(&entry).write_owned().await;
        let mut map = self.polls.write().await;
        if map.contains_key(&poll_id) {
            return Err(PollError::Internal(format!("poll {poll_id} already exists")));
        }
        map.insert(poll_id, entry);
        Ok(guard)
    }

    /// Returns the poll record behind its per-poll lock.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`] if no poll with the given ID
    /// exists.
    pub async fn get(&self, poll_id: PollId) -> Result<Arc<RwLock<PollRecord>>, PollError> {
        let map = self.polls.read().await;
        map.get(&poll_id)
            .map(Arc::clone)
            .ok_or(PollError::PollNotFound(*poll_id.as_uuid()))
    }

    /// Removes a poll together with its options and votes.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`] if no poll with the given ID
    /// exists.
    pub async fn remove(&self, poll_id: PollId) -> Result<Arc<RwLock<PollRecord>>, PollError> {
        let mut map = self.polls.write().await;
        map.remove(&poll_id)
            .ok_or(PollError::PollNotFound(*poll_id.as_uuid()))
    }

    /// Returns a snapshot of every poll.
    ///
    /// The map lock is released before any record lock is taken.
    pub async fn polls(&self) -> Vec<Poll> {
        let records: Vec<_> = self.polls.read().await.values().map(Arc::clone).collect();
        let mut polls = Vec::with_capacity(records.len());
        for record in records {
            let record = record.read().await;
            if !record.removed {
                polls.push(record.poll.clone());
            }
        }
        polls
    }

    /// Loads previously persisted polls and votes, replacing any poll with
    /// the same ID. Votes whose poll is unknown are skipped.
    ///
    /// Returns the number of polls loaded.
    pub async fn restore(&self, polls: Vec<Poll>, votes: Vec<Vote>, now: DateTime<Utc>) -> usize {
        let mut by_poll: HashMap<PollId, Vec<Vote>> = HashMap::new();
        for vote in votes {
            by_poll.entry(vote.poll_id).or_default().push(vote);
        }

        let mut map = self.polls.write().await;
        let count = polls.len();
        for poll in polls {
            let mut poll_votes = by_poll.remove(&poll.id).unwrap_or_default();
            poll_votes.sort_by_key(|v| v.created_at);
            let record = PollRecord::with_votes(poll, poll_votes, now);
            map.insert(record.poll.id, Arc::new(RwLock::new(record)));
        }
        if !by_poll.is_empty() {
            tracing::warn!(orphaned = by_poll.len(), "skipped votes for unknown polls");
        }
        count
    }

    /// Returns the number of polls in the store.
    pub async fn len(&self) -> usize {
        self.polls.read().await.len()
    }

    /// Returns `true` if the store contains no polls.
    pub async fn is_empty(&self) -> bool {
        self.polls.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::VoteId;
    use crate::domain::poll::fixtures::poll_with_counts;

    fn fresh_record() -> PollRecord {
        PollRecord::new(poll_with_counts(&[9, 9]), Utc::now())
    }

    fn vote_for(poll: &Poll, user_id: Option<UserId>, origin: Option<&str>) -> Vote {
        let Some(option) = poll.options.first() else {
            panic!("fixture poll has options");
        };
        Vote {
            id: VoteId::new(),
            poll_id: poll.id,
            option_id: option.id,
            user_id,
            voter_ip: origin.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn new_record_resets_counts() {
        let record = fresh_record();
        assert_eq!(record.poll.total_votes(), 0);
        assert!(record.poll.options.iter().all(|o| o.vote_count == Some(0)));
        assert_eq!(record.analytics.total_votes, 0);
    }

    #[test]
    fn push_vote_updates_counts_and_analytics() {
        let mut record = fresh_record();
        let user = UserId::new();
        let vote = vote_for(&record.poll, Some(user), None);
        record.push_vote(vote, Utc::now());

        assert_eq!(record.poll.total_votes(), 1);
        assert_eq!(record.analytics.total_votes, 1);
        assert_eq!(record.analytics.unique_voters, 1);
        assert!(record.has_user_voted(user));
        assert!(!record.has_user_voted(UserId::new()));
    }

    #[test]
    fn origin_check_ignores_identified_votes() {
        let mut record = fresh_record();
        let vote = vote_for(&record.poll, Some(UserId::new()), Some("10.1.1.1"));
        record.push_vote(vote, Utc::now());
        assert!(!record.has_origin_voted("10.1.1.1"));

        let anon = vote_for(&record.poll, None, Some("10.1.1.1"));
        record.push_vote(anon, Utc::now());
        assert!(record.has_origin_voted("10.1.1.1"));
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = PollStore::new();
        let record = fresh_record();
        let id = record.poll.id;

        let Ok(inserted) = store.insert(record).await else {
            panic!("insert failed");
        };
        assert_eq!(inserted.poll.id, id);
        drop(inserted);
        assert!(store.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn inserted_record_stays_locked_until_guard_drops() {
        let store = PollStore::new();
        let record = fresh_record();
        let id = record.poll.id;

        let Ok(guard) = store.insert(record).await else {
            panic!("insert failed");
        };
        let Ok(handle) = store.get(id).await else {
            panic!("inserted poll missing");
        };
        assert!(handle.try_read().is_err());
        drop(guard);
        assert!(handle.try_read().is_ok());
    }

    #[tokio::test]
    async fn snapshot_skips_removed_records() {
        let store = PollStore::new();
        let _ = store.insert(fresh_record()).await;
        let record = fresh_record();
        let id = record.poll.id;
        let _ = store.insert(record).await;

        let Ok(handle) = store.get(id).await else {
            panic!("inserted poll missing");
        };
        handle.write().await.removed = true;
        assert_eq!(store.polls().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = PollStore::new();
        let record = fresh_record();
        let _ = store.insert(record.clone()).await;
        assert!(store.insert(record).await.is_err());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_not_found() {
        let store = PollStore::new();
        let result = store.get(PollId::new()).await;
        assert!(matches!(result, Err(PollError::PollNotFound(_))));
    }

    #[tokio::test]
    async fn remove_deletes_poll() {
        let store = PollStore::new();
        let record = fresh_record();
        let id = record.poll.id;
        let _ = store.insert(record).await;

        assert!(store.remove(id).await.is_ok());
        assert!(store.get(id).await.is_err());
        assert!(store.remove(id).await.is_err());
    }

    #[tokio::test]
    async fn len_and_is_empty() {
        let store = PollStore::new();
        assert!(store.is_empty().await);
        let _ = store.insert(fresh_record()).await;
        let _ = store.insert(fresh_record()).await;
        assert_eq!(store.len().await, 2);
        assert_eq!(store.polls().await.len(), 2);
    }

    #[tokio::test]
    async fn restore_recomputes_counts_from_votes() {
        let store = PollStore::new();
        let poll = poll_with_counts(&[100, 100]);
        let first = vote_for(&poll, Some(UserId::new()), None);
        let second = vote_for(&poll, None, Some("10.0.0.7"));
        let orphan = vote_for(&poll_with_counts(&[0, 0]), None, None);
        let id = poll.id;

        let loaded = store
            .restore(vec![poll], vec![first, second, orphan], Utc::now())
            .await;
        assert_eq!(loaded, 1);

        let Ok(record) = store.get(id).await else {
            panic!("restored poll missing");
        };
        let record = record.read().await;
        assert_eq!(record.poll.total_votes(), 2);
        assert_eq!(record.analytics.unique_voters, 2);
    }
}
