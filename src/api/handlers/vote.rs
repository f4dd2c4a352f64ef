//! Voting and read-side handlers: vote, results, analytics, share links.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::actor::Actor;
use crate::api::dto::{AnalyticsResponse, VoteResponse};
use crate::app_state::AppState;
use crate::domain::{PollId, PollResults, ShareLinks};
use crate::error::{ErrorResponse, PollError};
use crate::validation::VoteInput;

/// `POST /polls/{id}/vote` — Cast a vote.
///
/// # Errors
///
/// Returns [`PollError::Validation`] for a missing or malformed option id,
/// [`PollError::PollNotFound`], [`PollError::PollExpired`],
/// [`PollError::InvalidOption`], or [`PollError::DuplicateVote`].
#[utoipa::path(
    post,
    path = "/api/v1/polls/{id}/vote",
    tag = "Votes",
    summary = "Cast a vote",
    description = "Records one vote for an option of the poll. Anonymous votes are allowed on public polls; single-vote polls reject a second vote by the same user.",
    request_body = VoteInput,
    params(
        ("id" = uuid::Uuid, Path, description = "Poll UUID"),
        ("x-user-id" = Option<uuid::Uuid>, Header, description = "Caller user id"),
    ),
    responses(
        (status = 201, description = "Vote recorded", body = VoteResponse),
        (status = 400, description = "Invalid option, expired poll, or validation failure", body = ErrorResponse),
        (status = 401, description = "Private poll requires a user", body = ErrorResponse),
        (status = 404, description = "Poll not found", body = ErrorResponse),
        (status = 409, description = "Already voted", body = ErrorResponse),
    )
)]
pub async fn cast_vote(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PollId>, PathRejection>,
    body: Result<Json<VoteInput>, JsonRejection>,
) -> Result<impl IntoResponse, PollError> {
    let Path(poll_id) = path?;
    let Json(input) = body?;
    let option_id = input.validate()?;

    let vote = state
        .poll_service
        .cast_vote(poll_id, option_id, actor.voter())
        .await?;

    Ok((StatusCode::CREATED, Json(VoteResponse::recorded(vote))))
}

/// `GET /polls/{id}/results` — Current results.
///
/// # Errors
///
/// Returns [`PollError::PollNotFound`] if the poll does not exist or is
/// private to another user.
#[utoipa::path(
    get,
    path = "/api/v1/polls/{id}/results",
    tag = "Votes",
    summary = "Poll results",
    description = "Per-option vote counts and percentages (two decimals), status, and time until expiry.",
    params(("id" = uuid::Uuid, Path, description = "Poll UUID")),
    responses(
        (status = 200, description = "Poll results", body = PollResults),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn poll_results(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PollId>, PathRejection>,
) -> Result<impl IntoResponse, PollError> {
    let Path(poll_id) = path?;
    let results = state
        .poll_service
        .poll_results(poll_id, actor.user_id)
        .await?;
    Ok(Json(results))
}

/// `GET /polls/{id}/analytics` — Stored analytics and summary.
///
/// # Errors
///
/// Returns [`PollError::PollNotFound`] if the poll does not exist or is
/// private to another user.
#[utoipa::path(
    get,
    path = "/api/v1/polls/{id}/analytics",
    tag = "Votes",
    summary = "Poll analytics",
    params(("id" = uuid::Uuid, Path, description = "Poll UUID")),
    responses(
        (status = 200, description = "Poll analytics", body = AnalyticsResponse),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn poll_analytics(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PollId>, PathRejection>,
) -> Result<impl IntoResponse, PollError> {
    let Path(poll_id) = path?;
    let (analytics, summary) = state
        .poll_service
        .poll_analytics(poll_id, actor.user_id)
        .await?;
    Ok(Json(AnalyticsResponse { analytics, summary }))
}

/// `GET /polls/{id}/share` — Shareable links.
///
/// # Errors
///
/// Returns [`PollError::PollNotFound`] if the poll does not exist or is
/// private to another user.
#[utoipa::path(
    get,
    path = "/api/v1/polls/{id}/share",
    tag = "Votes",
    summary = "Share links",
    params(("id" = uuid::Uuid, Path, description = "Poll UUID")),
    responses(
        (status = 200, description = "Share links", body = ShareLinks),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn share_links(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PollId>, PathRejection>,
) -> Result<impl IntoResponse, PollError> {
    let Path(poll_id) = path?;
    let links = state
        .poll_service
        .share_links(poll_id, actor.user_id)
        .await?;
    Ok(Json(links))
}

/// Voting and results routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/polls/{id}/vote", post(cast_vote))
        .route("/polls/{id}/results", get(poll_results))
        .route("/polls/{id}/analytics", get(poll_analytics))
        .route("/polls/{id}/share", get(share_links))
}
