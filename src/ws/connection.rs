//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection:
//! dispatches incoming commands, forwards filtered events, and pushes a
//! results snapshot for every subscribed poll on each refresh tick.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{PollEvent, PollId, UserId};
use crate::error::PollError;
use crate::service::PollService;

/// Per-connection context.
#[derive(Debug)]
pub struct Connection {
    service: Arc<PollService>,
    viewer: Option<UserId>,
    subs: SubscriptionManager,
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
/// - Every `refresh` period, sends current results for each explicitly
///   subscribed poll. The ticker lives in this loop and stops with it.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<PollEvent>,
    service: Arc<PollService>,
    viewer: Option<UserId>,
    refresh: Duration,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut conn = Connection::new(service, viewer);

    let mut ticker = tokio::time::interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = conn.handle_text_message(&text).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(poll_event) => {
                        if let Some(json) = conn.forward_event(&poll_event)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // Live results refresh
            _ = ticker.tick() => {
                let mut closed = false;
                for json in conn.refresh_results().await {
                    if ws_tx.send(Message::text(json)).await.is_err() {
                        closed = true;
                        break;
                    }
                }
                if closed {
                    break;
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

impl Connection {
    /// Creates a connection context for `viewer`.
    #[must_use]
    pub fn new(service: Arc<PollService>, viewer: Option<UserId>) -> Self {
        Self {
            service,
            viewer,
            subs: SubscriptionManager::new(),
        }
    }

    /// Current subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subs
    }

    /// Handles a text message from the client, returning an optional JSON
    /// response.
    pub async fn handle_text_message(&mut self, text: &str) -> Option<String> {
        let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
            return WsMessage::error(String::new(), 400, "malformed JSON").to_json();
        };

        let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
            return WsMessage::error(msg.id, 404, "unknown command").to_json();
        };

        let payload = match command {
            WsCommand::Subscribe { poll_ids } => self.subscribe(&poll_ids).await,
            WsCommand::Unsubscribe { poll_ids } => {
                let ids: Vec<PollId> = poll_ids.iter().filter_map(|s| s.parse().ok()).collect();
                self.subs.unsubscribe(&ids);
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": self.subs.count(),
                })
            }
            WsCommand::GetResults { poll_id } => {
                let Ok(poll_id) = poll_id.parse::<PollId>() else {
                    return WsMessage::error(msg.id, 400, "invalid poll id").to_json();
                };
                match self.service.poll_results(poll_id, self.viewer).await {
                    Ok(results) => serde_json::to_value(&results).unwrap_or_default(),
                    Err(err) => {
                        return WsMessage::error(msg.id, err.status_code().as_u16(), &err.to_string())
                            .to_json();
                    }
                }
            }
        };

        WsMessage::new(msg.id, WsMessageType::Response, payload).to_json()
    }

    /// Subscribes to every visible poll in `poll_ids`; unknown or hidden
    /// polls are reported back as rejected.
    async fn subscribe(&mut self, poll_ids: &[String]) -> serde_json::Value {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        let mut wildcard = false;

        for raw in poll_ids {
            if raw == "*" {
                wildcard = true;
                continue;
            }
            match raw.parse::<PollId>() {
                Ok(id) if self.service.get_poll(id, self.viewer).await.is_ok() => {
                    accepted.push(id);
                }
                _ => rejected.push(raw.clone()),
            }
        }

        self.subs.subscribe(&accepted, wildcard);
        serde_json::json!({
            "subscribed": accepted.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "rejected": rejected,
            "count": self.subs.count(),
            "wildcard": self.subs.is_subscribed_all(),
        })
    }

    /// Serializes `event` if it matches the subscriptions and the viewer
    /// may see the poll. A subscription to a poll that turned private for
    /// this viewer is dropped without forwarding; a deleted poll is dropped
    /// after its event is forwarded.
    pub fn forward_event(&mut self, event: &PollEvent) -> Option<String> {
        let poll_id = event.poll_id();
        if !self.subs.matches(poll_id, event.is_public()) {
            return None;
        }
        if !event.is_visible_to(self.viewer) {
            tracing::debug!(%poll_id, "poll hidden from viewer, dropping subscription");
            self.subs.unsubscribe(&[poll_id]);
            return None;
        }
        if matches!(event, PollEvent::PollDeleted { .. }) {
            self.subs.unsubscribe(&[poll_id]);
        }
        WsMessage::server(
            WsMessageType::Event,
            serde_json::to_value(event).unwrap_or_default(),
        )
        .to_json()
    }

    /// Results snapshots for every explicitly subscribed poll. Polls that
    /// disappeared are unsubscribed.
    pub async fn refresh_results(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        for poll_id in self.subs.poll_ids() {
            match self.service.poll_results(poll_id, self.viewer).await {
                Ok(results) => {
                    let payload = serde_json::to_value(&results).unwrap_or_default();
                    if let Some(json) = WsMessage::server(WsMessageType::Results, payload).to_json() {
                        out.push(json);
                    }
                }
                Err(PollError::PollNotFound(_)) => self.subs.unsubscribe(&[poll_id]),
                Err(err) => tracing::warn!(%poll_id, error = %err, "results refresh failed"),
            }
        }
        out
    }
}
