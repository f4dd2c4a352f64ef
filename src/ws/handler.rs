//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::api::actor::Actor;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The caller's `x-user-id` header decides which private polls the
/// connection may follow.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    actor: Actor,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let event_rx = state.event_bus.subscribe();
    let poll_service = Arc::clone(&state.poll_service);
    let refresh = state.results_refresh;

    tracing::debug!(viewer = ?actor.user_id, origin = %actor.origin, "ws upgrade");
    ws.on_upgrade(move |socket| {
        run_connection(socket, event_rx, poll_service, actor.user_id, refresh)
    })
}
