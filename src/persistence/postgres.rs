//! PostgreSQL implementation of the persistence layer.

use std::collections::HashMap;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::models::{OptionRow, PollRow, VoteRow, option_from_row, poll_from_row, vote_from_row};
use crate::config::AppConfig;
use crate::domain::{JournalEntry, Poll, PollChange, PollId, Vote};
use crate::error::PollError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] if the database is unreachable.
    pub async fn connect(config: &AppConfig) -> Result<Self, PollError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), PollError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PollError::Persistence(e.to_string()))
    }

    /// Applies one journaled change to the tables and appends its event to
    /// the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] on database failure.
    pub async fn apply(&self, entry: &JournalEntry) -> Result<(), PollError> {
        match &entry.change {
            PollChange::Saved(poll) => self.upsert_poll(poll).await?,
            PollChange::Removed(poll_id) => {
                self.delete_poll(*poll_id).await?;
            }
            PollChange::Voted { vote, single_vote } => {
                self.insert_vote(vote, *single_vote).await?;
                self.refresh_analytics(vote.poll_id).await?;
            }
        }

        let event = &entry.event;
        let payload = serde_json::to_value(event)
            .map_err(|e| PollError::Internal(format!("event serialization: {e}")))?;
        self.save_event(*event.poll_id().as_uuid(), event.event_type_str(), &payload)
            .await?;
        Ok(())
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] on database failure.
    pub async fn save_event(
        &self,
        poll_id: Uuid,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, PollError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (poll_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(poll_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Inserts or updates a poll row; options are inserted once and never
    /// changed afterwards.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] on database failure.
    pub async fn upsert_poll(&self, poll: &Poll) -> Result<(), PollError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO polls (id, title, description, creator_id, is_public, allow_multiple_votes, \
             expires_at, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, description = EXCLUDED.description, \
             is_public = EXCLUDED.is_public, expires_at = EXCLUDED.expires_at, updated_at = EXCLUDED.updated_at",
        )
        .bind(poll.id.as_uuid())
        .bind(&poll.title)
        .bind(&poll.description)
        .bind(poll.creator_id.as_uuid())
        .bind(poll.is_public)
        .bind(poll.allow_multiple_votes)
        .bind(poll.expires_at)
        .bind(poll.created_at)
        .bind(poll.updated_at)
        .execute(&mut *tx)
        .await?;

        for option in &poll.options {
            sqlx::query(
                "INSERT INTO poll_options (id, poll_id, text, order_index, created_at) \
                 VALUES ($1, $2, $3, $4, $5) ON CONFLICT (id) DO NOTHING",
            )
            .bind(option.id.as_uuid())
            .bind(poll.id.as_uuid())
            .bind(&option.text)
            .bind(i32::try_from(option.order_index).unwrap_or(i32::MAX))
            .bind(option.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a poll; options, votes, and analytics cascade.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] on database failure.
    pub async fn delete_poll(&self, poll_id: PollId) -> Result<u64, PollError> {
        let result = sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(poll_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Inserts a vote. `single_vote` marks votes on polls that disallow
    /// multiple votes, which the unique index constrains per user.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] on database failure, including
    /// a violated single-vote index.
    pub async fn insert_vote(&self, vote: &Vote, single_vote: bool) -> Result<(), PollError> {
        sqlx::query(
            "INSERT INTO votes (id, poll_id, option_id, user_id, voter_ip, single_vote, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(vote.id.as_uuid())
        .bind(vote.poll_id.as_uuid())
        .bind(vote.option_id.as_uuid())
        .bind(vote.user_id.map(Uuid::from))
        .bind(&vote.voter_ip)
        .bind(single_vote)
        .bind(vote.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Recomputes the stored analytics row of a poll from its votes.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] on database failure.
    pub async fn refresh_analytics(&self, poll_id: PollId) -> Result<(), PollError> {
        sqlx::query(
            "INSERT INTO poll_analytics (poll_id, total_votes, unique_voters, last_vote_at, updated_at) \
             SELECT $1, COUNT(*), \
                    COUNT(DISTINCT COALESCE(user_id::text, 'origin:' || COALESCE(voter_ip, 'unknown'))), \
                    MAX(created_at), NOW() \
             FROM votes WHERE poll_id = $1 \
             ON CONFLICT (poll_id) DO UPDATE SET total_votes = EXCLUDED.total_votes, \
             unique_voters = EXCLUDED.unique_voters, last_vote_at = EXCLUDED.last_vote_at, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(poll_id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Loads every poll with its options in display order.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] on database failure.
    pub async fn load_polls(&self) -> Result<Vec<Poll>, PollError> {
        let poll_rows = sqlx::query_as::<_, PollRow>(
            "SELECT id, title, description, creator_id, is_public, allow_multiple_votes, \
             expires_at, created_at, updated_at FROM polls ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let option_rows = sqlx::query_as::<_, OptionRow>(
            "SELECT id, poll_id, text, order_index, created_at FROM poll_options \
             ORDER BY poll_id, order_index ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut options_by_poll: HashMap<Uuid, Vec<_>> = HashMap::new();
        for row in option_rows {
            let option = option_from_row(row);
            options_by_poll
                .entry(*option.poll_id.as_uuid())
                .or_default()
                .push(option);
        }

        Ok(poll_rows
            .into_iter()
            .map(|row| {
                let mut poll = poll_from_row(row);
                poll.options = options_by_poll
                    .remove(poll.id.as_uuid())
                    .unwrap_or_default();
                poll
            })
            .collect())
    }

    /// Loads every vote in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError::Persistence`] on database failure.
    pub async fn load_votes(&self) -> Result<Vec<Vote>, PollError> {
        let rows = sqlx::query_as::<_, VoteRow>(
            "SELECT id, poll_id, option_id, user_id, voter_ip, created_at FROM votes \
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(vote_from_row).collect())
    }
}
