//! Per-connection subscription manager.
//!
//! Tracks which poll IDs a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::PollId;

/// Manages the set of poll subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Explicitly subscribed poll IDs.
    poll_ids: HashSet<PollId>,
    /// Whether the client follows every public poll (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds poll IDs to the subscription set, optionally enabling the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[PollId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.poll_ids.extend(ids.iter().copied());
    }

    /// Removes poll IDs from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[PollId]) {
        for id in ids {
            self.poll_ids.remove(id);
        }
    }

    /// Returns `true` if an event for the given poll should be forwarded.
    ///
    /// The wildcard only covers public polls; private polls must be
    /// subscribed to explicitly.
    #[must_use]
    pub fn matches(&self, poll_id: PollId, is_public: bool) -> bool {
        self.poll_ids.contains(&poll_id) || (self.subscribe_all && is_public)
    }

    /// Explicitly subscribed poll IDs, which receive periodic results.
    #[must_use]
    pub fn poll_ids(&self) -> Vec<PollId> {
        self.poll_ids.iter().copied().collect()
    }

    /// Returns the number of explicitly subscribed poll IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.poll_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
