//! Poll service: orchestrates poll operations and emits events.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::analytics::summarize_poll;
use crate::domain::lifecycle::{self, PollStatus};
use crate::domain::{
    EventBus, OptionId, Poll, PollAnalytics, PollChange, PollEvent, PollId, PollOption,
    PollRecord, PollResults, PollStore, PollSummaryStats, ShareLinks, UserId, Vote, VoteId,
};
use crate::error::PollError;
use crate::validation::{NewPoll, PollPatch, PollQuery, SortField, SortOrder, StatusFilter};

/// Behavior switches for [`PollService`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Base URL used to build shareable links.
    pub public_app_url: String,
    /// Apply the single-vote rule to anonymous voters by network origin.
    pub dedupe_anonymous_votes: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            public_app_url: "http://localhost:3000".to_string(),
            dedupe_anonymous_votes: false,
        }
    }
}

/// Who is casting a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voter {
    /// Identified user, if signed in.
    pub user_id: Option<UserId>,
    /// Network origin of the request.
    pub origin: String,
}

/// One page of a poll listing.
#[derive(Debug, Clone)]
pub struct PollPage {
    /// Polls on the requested page.
    pub items: Vec<Poll>,
    /// Number of polls matching the query across all pages.
    pub total: usize,
}

/// Orchestration layer for every poll operation.
///
/// Owns references to the [`PollStore`] for state and the [`EventBus`]
/// for event emission. Every mutation follows the pattern: acquire lock →
/// check rules → mutate → emit event → release lock, so events and journal
/// entries for one poll leave in the order the mutations were applied.
#[derive(Debug, Clone)]
pub struct PollService {
    store: Arc<PollStore>,
    event_bus: EventBus,
    options: ServiceOptions,
}

impl PollService {
    /// Creates a new `PollService`.
    #[must_use]
    pub fn new(store: Arc<PollStore>, event_bus: EventBus, options: ServiceOptions) -> Self {
        Self {
            store,
            event_bus,
            options,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`PollStore`].
    #[must_use]
    pub fn store(&self) -> &Arc<PollStore> {
        &self.store
    }

    /// Creates a poll owned by `creator` with zero votes per option.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError`] if the poll cannot be stored.
    pub async fn create_poll(&self, creator: UserId, new_poll: NewPoll) -> Result<Poll, PollError> {
        let now = Utc::now();
        let poll_id = PollId::new();
        let options = new_poll
            .options
            .into_iter()
            .zip(0u32..)
            .map(|(text, order_index)| PollOption {
                id: OptionId::new(),
                poll_id,
                text,
                order_index,
                created_at: now,
                vote_count: Some(0),
            })
            .collect();

        let poll = Poll {
            id: poll_id,
            title: new_poll.title,
            description: new_poll.description,
            creator_id: creator,
            is_public: new_poll.is_public,
            allow_multiple_votes: new_poll.allow_multiple_votes,
            expires_at: new_poll.expires_at,
            created_at: now,
            updated_at: now,
            options,
        };

        let record = self.store.insert(PollRecord::new(poll.clone(), now)).await?;
        self.event_bus
            .emit(
                PollChange::Saved(poll.clone()),
                PollEvent::PollCreated {
                    poll: poll.clone(),
                    timestamp: now,
                },
            )
            .await;
        drop(record);

        tracing::info!(%poll_id, %creator, options = poll.options.len(), "poll created");
        Ok(poll)
    }

    /// Returns the poll if `viewer` may see it.
    ///
    /// Private polls are visible to their creator only; anyone else gets
    /// the same not-found answer as for a missing poll.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`] if the poll does not exist or is
    /// not visible to `viewer`.
    pub async fn get_poll(&self, poll_id: PollId, viewer: Option<UserId>) -> Result<Poll, PollError> {
        let record = self.store.get(poll_id).await?;
        let record = record.read().await;
        ensure_visible(&record.poll, viewer)?;
        Ok(record.poll.clone())
    }

    /// Lists polls visible in listings to `viewer`: every public poll plus
    /// the viewer's own private polls, filtered, sorted, and paginated.
    pub async fn list_polls(&self, query: &PollQuery, viewer: Option<UserId>) -> PollPage {
        let now = Utc::now();
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut polls: Vec<Poll> = self
            .store
            .polls()
            .await
            .into_iter()
            .filter(|poll| poll.is_public || viewer.is_some_and(|v| poll.is_created_by(v)))
            .filter(|poll| match query.status {
                StatusFilter::All => true,
                StatusFilter::Active => lifecycle::poll_status(poll, now) == PollStatus::Active,
                StatusFilter::Expired => lifecycle::poll_status(poll, now) == PollStatus::Expired,
            })
            .filter(|poll| needle.as_deref().is_none_or(|needle| matches_search(poll, needle)))
            .collect();

        polls.sort_by(|a, b| {
            let ordering = compare_polls(a, b, query.sort_by);
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = polls.len();
        let start = (query.page.saturating_sub(1) as usize).saturating_mul(query.limit as usize);
        let items = polls
            .into_iter()
            .skip(start)
            .take(query.limit as usize)
            .collect();

        PollPage { items, total }
    }

    /// Applies a partial update on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`] if the poll does not exist and
    /// [`PollError::Forbidden`] if `actor` is not its creator.
    pub async fn update_poll(
        &self,
        poll_id: PollId,
        actor: UserId,
        patch: PollPatch,
    ) -> Result<Poll, PollError> {
        let record = self.store.get(poll_id).await?;
        let mut record = record.write().await;
        ensure_live(&record)?;
        ensure_creator(&record.poll, actor)?;

        let now = Utc::now();
        let poll = &mut record.poll;
        if let Some(title) = patch.title {
            poll.title = title;
        }
        if let Some(description) = patch.description {
            poll.description = description;
        }
        if let Some(expires_at) = patch.expires_at {
            poll.expires_at = Some(expires_at);
        }
        if let Some(is_public) = patch.is_public {
            poll.is_public = is_public;
        }
        poll.updated_at = now;
        let updated = poll.clone();

        self.event_bus
            .emit(
                PollChange::Saved(updated.clone()),
                PollEvent::PollUpdated {
                    poll: updated.clone(),
                    timestamp: now,
                },
            )
            .await;
        drop(record);

        tracing::info!(%poll_id, %actor, "poll updated");
        Ok(updated)
    }

    /// Deletes a poll with its options and votes on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`] if the poll does not exist and
    /// [`PollError::Forbidden`] if `actor` is not its creator.
    pub async fn delete_poll(&self, poll_id: PollId, actor: UserId) -> Result<(), PollError> {
        let record = self.store.get(poll_id).await?;
        let mut record = record.write().await;
        ensure_live(&record)?;
        ensure_creator(&record.poll, actor)?;

        self.store.remove(poll_id).await?;
        record.removed = true;

        self.event_bus
            .emit(
                PollChange::Removed(poll_id),
                PollEvent::PollDeleted {
                    poll_id,
                    creator_id: record.poll.creator_id,
                    is_public: record.poll.is_public,
                    timestamp: Utc::now(),
                },
            )
            .await;
        drop(record);

        tracing::info!(%poll_id, %actor, "poll deleted");
        Ok(())
    }

    /// Records a vote for `option_id` in `poll_id`.
    ///
    /// Checks run in order: poll exists, poll not expired, voter allowed,
    /// option belongs to poll, no duplicate vote. The duplicate check and
    /// the insert happen under the poll's write lock. Anonymous votes are
    /// only de-duplicated by origin when
    /// [`ServiceOptions::dedupe_anonymous_votes`] is set.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`], [`PollError::PollExpired`],
    /// [`PollError::Unauthorized`], [`PollError::InvalidOption`], or
    /// [`PollError::DuplicateVote`]. Nothing is stored on rejection.
    pub async fn cast_vote(
        &self,
        poll_id: PollId,
        option_id: OptionId,
        voter: Voter,
    ) -> Result<Vote, PollError> {
        let record = self.store.get(poll_id).await?;
        let mut record = record.write().await;
        ensure_live(&record)?;
        let now = Utc::now();

        if lifecycle::is_poll_expired(&record.poll, now) {
            tracing::debug!(%poll_id, "vote rejected: poll expired");
            return Err(PollError::PollExpired(*poll_id.as_uuid()));
        }
        if !lifecycle::can_user_vote(&record.poll, voter.user_id, now) {
            return Err(PollError::Unauthorized);
        }
        if record.poll.option(option_id).is_none() {
            tracing::debug!(%poll_id, %option_id, "vote rejected: invalid option");
            return Err(PollError::InvalidOption {
                poll_id: *poll_id.as_uuid(),
                option_id: *option_id.as_uuid(),
            });
        }
        if !record.poll.allow_multiple_votes {
            let duplicate = match voter.user_id {
                Some(user_id) => record.has_user_voted(user_id),
                None => {
                    self.options.dedupe_anonymous_votes && record.has_origin_voted(&voter.origin)
                }
            };
            if duplicate {
                tracing::debug!(%poll_id, origin = %voter.origin, "vote rejected: duplicate");
                return Err(PollError::DuplicateVote);
            }
        }

        let vote = Vote {
            id: VoteId::new(),
            poll_id,
            option_id,
            user_id: voter.user_id,
            voter_ip: if voter.user_id.is_some() {
                None
            } else {
                Some(voter.origin.clone())
            },
            created_at: now,
        };
        record.push_vote(vote.clone(), now);

        self.event_bus
            .emit(
                PollChange::Voted {
                    vote: vote.clone(),
                    single_vote: !record.poll.allow_multiple_votes,
                },
                PollEvent::VoteCast {
                    poll_id,
                    option_id,
                    vote_id: vote.id,
                    creator_id: record.poll.creator_id,
                    is_public: record.poll.is_public,
                    total_votes: record.analytics.total_votes,
                    timestamp: now,
                },
            )
            .await;
        drop(record);

        tracing::info!(
            %poll_id,
            %option_id,
            vote_id = %vote.id,
            anonymous = vote.user_id.is_none(),
            origin = %voter.origin,
            "vote recorded"
        );
        Ok(vote)
    }

    /// Computes the current results of a poll as seen by `viewer`.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`] if the poll does not exist or is
    /// not visible to `viewer`.
    pub async fn poll_results(
        &self,
        poll_id: PollId,
        viewer: Option<UserId>,
    ) -> Result<PollResults, PollError> {
        let poll = self.get_poll(poll_id, viewer).await?;
        Ok(PollResults::compute(&poll, viewer, Utc::now()))
    }

    /// Returns the stored analytics and the derived summary of a poll.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`] if the poll does not exist or is
    /// not visible to `viewer`.
    pub async fn poll_analytics(
        &self,
        poll_id: PollId,
        viewer: Option<UserId>,
    ) -> Result<(PollAnalytics, PollSummaryStats), PollError> {
        let record = self.store.get(poll_id).await?;
        let record = record.read().await;
        ensure_visible(&record.poll, viewer)?;
        Ok((record.analytics.clone(), summarize_poll(&record.poll)))
    }

    /// Builds shareable links for a poll.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::PollNotFound`] if the poll does not exist or is
    /// not visible to `viewer`.
    pub async fn share_links(
        &self,
        poll_id: PollId,
        viewer: Option<UserId>,
    ) -> Result<ShareLinks, PollError> {
        let poll = self.get_poll(poll_id, viewer).await?;
        Ok(ShareLinks::for_poll(&self.options.public_app_url, &poll))
    }
}

fn ensure_visible(poll: &Poll, viewer: Option<UserId>) -> Result<(), PollError> {
    if poll.is_public || viewer.is_some_and(|v| poll.is_created_by(v)) {
        Ok(())
    } else {
        Err(PollError::PollNotFound(*poll.id.as_uuid()))
    }
}

fn ensure_live(record: &PollRecord) -> Result<(), PollError> {
    if record.removed {
        Err(PollError::PollNotFound(*record.poll.id.as_uuid()))
    } else {
        Ok(())
    }
}

fn ensure_creator(poll: &Poll, actor: UserId) -> Result<(), PollError> {
    if poll.is_created_by(actor) {
        Ok(())
    } else {
        tracing::warn!(poll_id = %poll.id, %actor, "rejected mutation by non-creator");
        Err(PollError::Forbidden)
    }
}

fn matches_search(poll: &Poll, needle: &str) -> bool {
    poll.title.to_lowercase().contains(needle)
        || poll
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

fn compare_polls(a: &Poll, b: &Poll, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::VoteCount => a.total_votes().cmp(&b.total_votes()),
    }
    .then_with(|| a.id.cmp(&b.id))
}
