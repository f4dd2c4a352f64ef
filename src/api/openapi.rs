//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::handlers;
use crate::error::ErrorResponse;
use crate::validation::FieldError;

/// Generated OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "quickpoll",
        description = "Create polls, vote, and follow results live."
    ),
    paths(
        handlers::poll::create_poll,
        handlers::poll::list_polls,
        handlers::poll::get_poll,
        handlers::poll::update_poll,
        handlers::poll::delete_poll,
        handlers::vote::cast_vote,
        handlers::vote::poll_results,
        handlers::vote::poll_analytics,
        handlers::vote::share_links,
        handlers::system::health_handler,
    ),
    components(schemas(ErrorResponse, FieldError)),
    tags(
        (name = "Polls", description = "Poll management"),
        (name = "Votes", description = "Voting, results, and sharing"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
