//! Background task draining the change journal into PostgreSQL.

use tokio::task::JoinHandle;

use super::postgres::PostgresPersistence;
use crate::domain::JournalReceiver;

/// Spawns a task that applies every journal entry from `journal`, in
/// order, through `persistence`.
///
/// A failed write is logged and the writer moves on to the next entry. The
/// task ends once every [`crate::domain::EventBus`] clone holding the
/// journal sender is dropped and the queue is drained.
pub fn spawn_journal_writer(
    persistence: PostgresPersistence,
    mut journal: JournalReceiver,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut written: u64 = 0;
        while let Some(entry) = journal.recv().await {
            match persistence.apply(&entry).await {
                Ok(()) => written = written.saturating_add(1),
                Err(err) => tracing::error!(
                    poll_id = %entry.event.poll_id(),
                    event_type = entry.event.event_type_str(),
                    error = %err,
                    "failed to persist change"
                ),
            }
        }
        tracing::info!(written, "persistence writer stopped");
    })
}
