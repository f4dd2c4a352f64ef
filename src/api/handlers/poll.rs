//! Poll CRUD handlers: create, list, get, update, delete.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::actor::Actor;
use crate::api::dto::{PaginationMeta, PollDto, PollListResponse, PollResponse, PollSummaryDto};
use crate::app_state::AppState;
use crate::domain::PollId;
use crate::error::{ErrorResponse, PollError};
use crate::validation::{CreatePollInput, PollQueryParams, UpdatePollInput};

/// `POST /polls` — Create a new poll.
///
/// # Errors
///
/// Returns [`PollError::Unauthorized`] without a user and
/// [`PollError::Validation`] when the payload breaks the create schema.
#[utoipa::path(
    post,
    path = "/api/v1/polls",
    tag = "Polls",
    summary = "Create a poll",
    description = "Creates a poll owned by the caller. Options are cleaned (trimmed, blank and case-insensitive duplicates dropped) before the 2–10 bound is checked.",
    request_body = CreatePollInput,
    params(("x-user-id" = uuid::Uuid, Header, description = "Caller user id")),
    responses(
        (status = 201, description = "Poll created", body = PollResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
    )
)]
pub async fn create_poll(
    State(state): State<AppState>,
    actor: Actor,
    body: Result<Json<CreatePollInput>, JsonRejection>,
) -> Result<impl IntoResponse, PollError> {
    let creator = actor.require_user()?;
    let Json(input) = body?;
    let new_poll = input.validate(Utc::now())?;

    let poll = state.poll_service.create_poll(creator, new_poll).await?;

    let response = PollResponse {
        poll: PollDto::from_poll(&poll, Utc::now()),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /polls` — List polls with search, status filter, sort, and paging.
///
/// # Errors
///
/// Returns [`PollError::Validation`] on out-of-range query parameters.
#[utoipa::path(
    get,
    path = "/api/v1/polls",
    tag = "Polls",
    summary = "List polls",
    description = "Returns public polls plus the caller's own private polls, filtered, sorted, and paginated.",
    params(PollQueryParams),
    responses(
        (status = 200, description = "Paginated poll list", body = PollListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
    )
)]
pub async fn list_polls(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<PollQueryParams>, QueryRejection>,
) -> Result<impl IntoResponse, PollError> {
    let Query(params) = query?;
    let query = params.validate()?;

    let page = state.poll_service.list_polls(&query, actor.user_id).await;

    let now = Utc::now();
    Ok(Json(PollListResponse {
        polls: page
            .items
            .iter()
            .map(|poll| PollSummaryDto::from_poll(poll, now))
            .collect(),
        pagination: PaginationMeta::new(query.page, query.limit, page.total),
    }))
}

/// `GET /polls/{id}` — Get a poll with its options and counts.
///
/// # Errors
///
/// Returns [`PollError::PollNotFound`] if the poll does not exist or is
/// private to another user.
#[utoipa::path(
    get,
    path = "/api/v1/polls/{id}",
    tag = "Polls",
    summary = "Get poll",
    params(("id" = uuid::Uuid, Path, description = "Poll UUID")),
    responses(
        (status = 200, description = "Poll details", body = PollResponse),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn get_poll(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PollId>, PathRejection>,
) -> Result<impl IntoResponse, PollError> {
    let Path(poll_id) = path?;
    let poll = state.poll_service.get_poll(poll_id, actor.user_id).await?;
    Ok(Json(PollResponse {
        poll: PollDto::from_poll(&poll, Utc::now()),
    }))
}

/// `PUT /polls/{id}` — Partially update a poll.
///
/// # Errors
///
/// Returns [`PollError::Unauthorized`] without a user,
/// [`PollError::Forbidden`] for non-creators, and
/// [`PollError::Validation`] for invalid fields.
#[utoipa::path(
    put,
    path = "/api/v1/polls/{id}",
    tag = "Polls",
    summary = "Update poll",
    description = "Updates title, description, expiry, or visibility. Only the creator may update a poll; options are immutable.",
    request_body = UpdatePollInput,
    params(
        ("id" = uuid::Uuid, Path, description = "Poll UUID"),
        ("x-user-id" = uuid::Uuid, Header, description = "Caller user id"),
    ),
    responses(
        (status = 200, description = "Updated poll", body = PollResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn update_poll(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PollId>, PathRejection>,
    body: Result<Json<UpdatePollInput>, JsonRejection>,
) -> Result<impl IntoResponse, PollError> {
    let Path(poll_id) = path?;
    let user_id = actor.require_user()?;
    let Json(input) = body?;
    let patch = input.validate(Utc::now())?;

    let poll = state.poll_service.update_poll(poll_id, user_id, patch).await?;
    Ok(Json(PollResponse {
        poll: PollDto::from_poll(&poll, Utc::now()),
    }))
}

/// `DELETE /polls/{id}` — Delete a poll with its options and votes.
///
/// # Errors
///
/// Returns [`PollError::Unauthorized`] without a user,
/// [`PollError::Forbidden`] for non-creators, and
/// [`PollError::PollNotFound`] if the poll does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/polls/{id}",
    tag = "Polls",
    summary = "Delete poll",
    params(
        ("id" = uuid::Uuid, Path, description = "Poll UUID"),
        ("x-user-id" = uuid::Uuid, Header, description = "Caller user id"),
    ),
    responses(
        (status = 204, description = "Poll deleted"),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Poll not found", body = ErrorResponse),
    )
)]
pub async fn delete_poll(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PollId>, PathRejection>,
) -> Result<impl IntoResponse, PollError> {
    let Path(poll_id) = path?;
    let user_id = actor.require_user()?;
    state.poll_service.delete_poll(poll_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Poll management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/polls", get(list_polls).post(create_poll))
        .route(
            "/polls/{id}",
            get(get_poll).put(update_poll).delete(delete_poll),
        )
}
