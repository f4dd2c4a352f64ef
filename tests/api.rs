//! End-to-end tests: the full router served on an ephemeral port and
//! driven over HTTP and WebSocket.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use quickpoll::api::build_app;
use quickpoll::app_state::AppState;
use quickpoll::domain::{EventBus, PollId, PollStore, UserId};
use quickpoll::service::{PollService, ServiceOptions};

struct TestApp {
    base: String,
    service: Arc<PollService>,
    client: reqwest::Client,
}

impl TestApp {
    async fn spawn() -> Self {
        let service = Arc::new(PollService::new(
            Arc::new(PollStore::new()),
            EventBus::new(256),
            ServiceOptions {
                public_app_url: "https://polls.test".to_string(),
                dedupe_anonymous_votes: false,
            },
        ));
        let app = build_app(AppState::new(
            Arc::clone(&service),
            Duration::from_millis(200),
        ));

        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: format!("http://{addr}"),
            service,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let Ok(response) = request.send().await else {
            panic!("request failed");
        };
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str, user: Option<UserId>) -> (StatusCode, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(user) = user {
            request = request.header("x-user-id", user.to_string());
        }
        self.send(request).await
    }

    async fn post(&self, path: &str, user: Option<UserId>, body: Value) -> (StatusCode, Value) {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(user) = user {
            request = request.header("x-user-id", user.to_string());
        }
        self.send(request).await
    }

    async fn create_poll(&self, creator: UserId, body: Value) -> Value {
        let (status, body) = self.post("/api/v1/polls", Some(creator), body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["poll"].clone()
    }

    async fn vote(&self, poll: &Value, option: usize, user: Option<UserId>) -> (StatusCode, Value) {
        let poll_id = poll["id"].as_str().unwrap_or_default();
        let option_id = poll["options"][option]["id"].clone();
        self.post(
            &format!("/api/v1/polls/{poll_id}/vote"),
            user,
            json!({ "optionId": option_id }),
        )
        .await
    }
}

async fn next_json<S>(socket: &mut S) -> Value
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(5), socket.next()).await
        else {
            panic!("no websocket message");
        };
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap_or(Value::Null);
        }
    }
}

fn basic_poll(title: &str) -> Value {
    json!({ "title": title, "options": ["Yes", "No"] })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn create_requires_user() {
    let app = TestApp::spawn().await;
    let (status, body) = app.post("/api/v1/polls", None, basic_poll("Q")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 1100);
}

#[tokio::test]
async fn create_cleans_options_and_starts_at_zero() {
    let app = TestApp::spawn().await;
    let creator = UserId::new();
    let poll = app
        .create_poll(
            creator,
            json!({
                "title": "  Favourite language?  ",
                "options": ["Rust", " rust ", "Go", ""],
                "allowMultipleVotes": false,
            }),
        )
        .await;

    assert_eq!(poll["title"], "Favourite language?");
    assert_eq!(poll["creator_id"], creator.to_string());
    assert_eq!(poll["status"], "active");
    assert_eq!(poll["is_public"], true);
    assert_eq!(poll["total_votes"], 0);
    let options = poll["options"].as_array().cloned().unwrap_or_default();
    let texts: Vec<&str> = options.iter().filter_map(|o| o["text"].as_str()).collect();
    assert_eq!(texts, vec!["Rust", "Go"]);
    assert!(options.iter().all(|o| o["vote_count"] == 0));
}

#[tokio::test]
async fn create_reports_every_field_error() {
    let app = TestApp::spawn().await;
    let past = (Utc::now() - TimeDelta::hours(1)).to_rfc3339();
    let (status, body) = app
        .post(
            "/api/v1/polls",
            Some(UserId::new()),
            json!({ "title": "", "options": ["Only"], "expiresAt": past }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
    let details = body["error"]["details"].as_array().cloned().unwrap_or_default();
    let fields: Vec<&str> = details.iter().filter_map(|d| d["field"].as_str()).collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"options"));
    assert!(fields.contains(&"expiresAt"));
}

#[tokio::test]
async fn malformed_json_is_a_structured_error() {
    let app = TestApp::spawn().await;
    let request = app
        .client
        .post(app.url("/api/v1/polls"))
        .header("x-user-id", UserId::new().to_string())
        .header("content-type", "application/json")
        .body("{\"title\":");
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1002);
}

#[tokio::test]
async fn vote_lifecycle() {
    let app = TestApp::spawn().await;
    let poll = app.create_poll(UserId::new(), basic_poll("Ship it?")).await;
    let poll_id = poll["id"].as_str().unwrap_or_default().to_string();
    let voter = UserId::new();

    let (status, body) = app.vote(&poll, 0, Some(voter)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Vote recorded successfully");
    assert_eq!(body["vote"]["user_id"], voter.to_string());
    assert!(body["vote"].get("voter_ip").is_none());

    let (status, body) = app.vote(&poll, 1, Some(voter)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], 4003);

    let (status, _) = app.vote(&poll, 1, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, results) = app.get(&format!("/api/v1/polls/{poll_id}/results"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["total_votes"], 2);
    assert_eq!(results["options"][0]["percentage"], 50.0);
    assert_eq!(results["options"][1]["percentage"], 50.0);
    assert_eq!(results["status"], "active");

    let (status, analytics) = app
        .get(&format!("/api/v1/polls/{poll_id}/analytics"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["analytics"]["total_votes"], 2);
    assert_eq!(analytics["analytics"]["unique_voters"], 2);
    assert_eq!(analytics["summary"]["total_options"], 2);
}

#[tokio::test]
async fn vote_rejections() {
    let app = TestApp::spawn().await;
    let poll = app.create_poll(UserId::new(), basic_poll("A")).await;
    let other = app.create_poll(UserId::new(), basic_poll("B")).await;
    let poll_id = poll["id"].as_str().unwrap_or_default();

    let (status, body) = app
        .post(
            &format!("/api/v1/polls/{poll_id}/vote"),
            None,
            json!({ "optionId": other["options"][0]["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 4002);

    let (status, body) = app
        .post(&format!("/api/v1/polls/{poll_id}/vote"), None, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "optionId");

    let missing = PollId::new();
    let (status, body) = app
        .post(
            &format!("/api/v1/polls/{missing}/vote"),
            None,
            json!({ "optionId": poll["options"][0]["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);

    let (status, _) = app.get("/api/v1/polls/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expired_poll_rejects_votes() {
    let app = TestApp::spawn().await;
    let poll = app.create_poll(UserId::new(), basic_poll("Closed")).await;
    let Ok(poll_id) = poll["id"].as_str().unwrap_or_default().parse::<PollId>() else {
        panic!("poll id is a uuid");
    };
    let Ok(record) = app.service.store().get(poll_id).await else {
        panic!("poll missing from store");
    };
    record.write().await.poll.expires_at = Some(Utc::now() - TimeDelta::seconds(5));

    let (status, body) = app.vote(&poll, 0, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 4001);

    let (_, results) = app.get(&format!("/api/v1/polls/{poll_id}/results"), None).await;
    assert_eq!(results["total_votes"], 0);
    assert_eq!(results["status"], "expired");
    assert_eq!(results["can_vote"], false);
}

#[tokio::test]
async fn multiple_vote_poll_accepts_repeat_votes() {
    let app = TestApp::spawn().await;
    let poll = app
        .create_poll(
            UserId::new(),
            json!({ "title": "Pick any", "options": ["a", "b", "c"], "allowMultipleVotes": true }),
        )
        .await;
    let voter = UserId::new();
    for option in [0, 1, 1] {
        let (status, _) = app.vote(&poll, option, Some(voter)).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn only_creator_may_update_or_delete() {
    let app = TestApp::spawn().await;
    let creator = UserId::new();
    let stranger = UserId::new();
    let poll = app.create_poll(creator, basic_poll("Mine")).await;
    let path = format!("/api/v1/polls/{}", poll["id"].as_str().unwrap_or_default());

    let update = |user: UserId| {
        app.client
            .put(app.url(&path))
            .header("x-user-id", user.to_string())
            .json(&json!({ "title": "Renamed", "isPublic": false }))
    };

    let (status, body) = app.send(update(stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], 2003);

    let (status, body) = app.send(update(creator)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["poll"]["title"], "Renamed");
    assert_eq!(body["poll"]["is_public"], false);

    let (status, _) = app.get(&path, Some(stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let delete = |user: UserId| {
        app.client
            .delete(app.url(&path))
            .header("x-user-id", user.to_string())
    };
    let (status, _) = app.send(delete(stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(delete(creator)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&path, Some(creator)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_searches_sorts_and_paginates() {
    let app = TestApp::spawn().await;
    let owner = UserId::new();
    for title in ["Rust or Go?", "Best editor", "rust async runtime", "Lunch"] {
        app.create_poll(owner, basic_poll(title)).await;
    }
    app.create_poll(
        owner,
        json!({ "title": "Rust secret", "options": ["a", "b"], "isPublic": false }),
    )
    .await;

    let (status, body) = app
        .get("/api/v1/polls?search=RUST&sortBy=title&sortOrder=asc", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["polls"]
        .as_array()
        .map(|polls| polls.iter().filter_map(|p| p["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["rust async runtime", "Rust or Go?"]);

    let (_, body) = app.get("/api/v1/polls?search=rust", Some(owner)).await;
    assert_eq!(body["pagination"]["total"], 3);

    let (_, body) = app.get("/api/v1/polls?page=2&limit=3", None).await;
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["polls"].as_array().map(Vec::len), Some(1));

    let (status, body) = app.get("/api/v1/polls?limit=500", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "limit");
}

#[tokio::test]
async fn share_links_use_public_url() {
    let app = TestApp::spawn().await;
    let poll = app.create_poll(UserId::new(), basic_poll("Share me")).await;
    let poll_id = poll["id"].as_str().unwrap_or_default();

    let (status, body) = app.get(&format!("/api/v1/polls/{poll_id}/share"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vote_url"], format!("https://polls.test/vote/{poll_id}"));
    assert_eq!(body["results_url"], format!("https://polls.test/polls/{poll_id}/results"));
    assert_eq!(
        body["share_text"],
        format!("Vote on: Share me - https://polls.test/vote/{poll_id}")
    );
}

#[tokio::test]
async fn websocket_streams_votes_and_results() {
    let app = TestApp::spawn().await;
    let poll = app.create_poll(UserId::new(), basic_poll("Live?")).await;
    let poll_id = poll["id"].as_str().unwrap_or_default().to_string();

    let ws_url = format!("{}/ws", app.base.replacen("http", "ws", 1));
    let Ok((mut socket, _)) = tokio_tungstenite::connect_async(ws_url).await else {
        panic!("websocket connect failed");
    };

    let subscribe = json!({
        "id": "sub-1",
        "type": "command",
        "timestamp": Utc::now(),
        "payload": { "command": "subscribe", "poll_ids": [poll_id] },
    });
    let Ok(()) = socket.send(Message::text(subscribe.to_string())).await else {
        panic!("send failed");
    };

    let reply = next_json(&mut socket).await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["count"], 1);

    let (status, _) = app.vote(&poll, 0, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut saw_event = false;
    let mut saw_results = false;
    for _ in 0..10 {
        let msg = next_json(&mut socket).await;
        match msg["type"].as_str() {
            Some("event") => {
                assert_eq!(msg["payload"]["event_type"], "vote_cast");
                assert_eq!(msg["payload"]["poll_id"], poll_id.as_str());
                assert_eq!(msg["payload"]["total_votes"], 1);
                assert!(msg["payload"].get("user_id").is_none());
                saw_event = true;
            }
            Some("results") if saw_event => {
                assert_eq!(msg["payload"]["total_votes"], 1);
                saw_results = true;
            }
            _ => {}
        }
        if saw_event && saw_results {
            break;
        }
    }
    assert!(saw_event, "vote event not forwarded");
    assert!(saw_results, "results snapshot not pushed");
}
