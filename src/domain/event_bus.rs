//! Fan-out of poll mutations to live subscribers and the change journal.
//!
//! A mutation leaves the service on two paths. The [`PollEvent`] goes to a
//! [`tokio::sync::broadcast`] channel read by WebSocket connections; a slow
//! connection may lag and skip events, which only costs it a live update
//! since the results ticker resends totals. The durable [`PollChange`] goes
//! to a bounded [`tokio::sync::mpsc`] journal read by the persistence
//! writer. The journal never drops: when it is full, [`EventBus::emit`]
//! waits for room.
//!
//! The service calls [`EventBus::emit`] while it still holds the poll's
//! write lock, so journal order per poll equals the order in which the
//! mutations were applied.

use tokio::sync::{broadcast, mpsc};

use super::{Poll, PollEvent, PollId, Vote};

/// Durable form of a mutation, applied verbatim to the database mirror.
#[derive(Debug, Clone)]
pub enum PollChange {
    /// Poll row and options to insert or overwrite.
    Saved(Poll),
    /// Poll to delete, cascading to options and votes.
    Removed(PollId),
    /// Vote to record.
    Voted {
        /// Full vote, voter identity included.
        vote: Vote,
        /// The poll allows one vote per user.
        single_vote: bool,
    },
}

/// One journal record: the change plus the event that announced it.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    /// What to write.
    pub change: PollChange,
    /// Public event, kept for the event log.
    pub event: PollEvent,
}

/// Receiving half of the change journal.
pub type JournalReceiver = mpsc::Receiver<JournalEntry>;

/// Dispatches every mutation to live subscribers and, when configured, to
/// the change journal.
#[derive(Debug, Clone)]
pub struct EventBus {
    live: broadcast::Sender<PollEvent>,
    journal: Option<mpsc::Sender<JournalEntry>>,
}

impl EventBus {
    /// Creates a bus without a journal. `live_capacity` is the broadcast
    /// ring size per receiver.
    #[must_use]
    pub fn new(live_capacity: usize) -> Self {
        let (live, _) = broadcast::channel(live_capacity.max(1));
        Self {
            live,
            journal: None,
        }
    }

    /// Creates a bus whose changes are also queued on a journal holding at
    /// most `journal_capacity` entries.
    #[must_use]
    pub fn with_journal(live_capacity: usize, journal_capacity: usize) -> (Self, JournalReceiver) {
        let (tx, rx) = mpsc::channel(journal_capacity.max(1));
        let mut bus = Self::new(live_capacity);
        bus.journal = Some(tx);
        (bus, rx)
    }

    /// Queues `change` on the journal, then broadcasts `event`.
    ///
    /// Waits while the journal is full. Returns the number of live
    /// receivers that got the event.
    pub async fn emit(&self, change: PollChange, event: PollEvent) -> usize {
        if let Some(journal) = &self.journal {
            let entry = JournalEntry {
                change,
                event: event.clone(),
            };
            if journal.send(entry).await.is_err() {
                tracing::error!(
                    poll_id = %event.poll_id(),
                    event_type = event.event_type_str(),
                    "change journal closed, mutation not persisted"
                );
            }
        }
        self.live.send(event).unwrap_or(0)
    }

    /// Subscribes to live events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.live.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.live.receiver_count()
    }

    /// Returns `true` if mutations are journaled for persistence.
    #[must_use]
    pub fn is_journaled(&self) -> bool {
        self.journal.is_some()
    }
}
