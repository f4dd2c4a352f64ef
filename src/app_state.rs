//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::EventBus;
use crate::service::PollService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Poll service for all business logic.
    pub poll_service: Arc<PollService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Period of the live-results push on each WebSocket connection.
    pub results_refresh: Duration,
}

impl AppState {
    /// Wires state around an existing service.
    #[must_use]
    pub fn new(poll_service: Arc<PollService>, results_refresh: Duration) -> Self {
        let event_bus = poll_service.event_bus().clone();
        Self {
            poll_service,
            event_bus,
            results_refresh,
        }
    }
}
