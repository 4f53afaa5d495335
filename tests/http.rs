// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2025-2026 Discord Relay Authors. All rights reserved.
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Integration tests for the Discord HTTP client using a mock Axum server.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use discord_relay::{
    config::DiscordRelayConfig,
    http::{
        client::DiscordHttpClient,
        error::DiscordHttpError,
        models::{ApplicationCommand, CommandOption, InteractionResponse, WebhookMessage},
    },
};
use serde_json::{json, Value};

// ------------------------------------------------------------------------------------------------
// Test Server
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Default)]
struct TestServerState {
    /// Number of 429 responses to serve before succeeding.
    rate_limits_remaining: Arc<AtomicUsize>,
    /// Number of 429 responses served.
    rate_limits_served: Arc<AtomicUsize>,
    /// Query strings and bodies of webhook executions that succeeded.
    webhook_requests: Arc<tokio::sync::Mutex<Vec<(String, Value)>>>,
    /// Authorization headers observed.
    auth_headers: Arc<tokio::sync::Mutex<Vec<String>>>,
    /// Interaction callback bodies observed.
    interaction_responses: Arc<tokio::sync::Mutex<Vec<Value>>>,
}

fn rate_limit_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-limit", "5".parse().unwrap());
    headers.insert("x-ratelimit-remaining", "4".parse().unwrap());
    headers.insert("x-ratelimit-reset", "1470173023.123".parse().unwrap());
    headers.insert("x-ratelimit-reset-after", "1.2".parse().unwrap());
    headers.insert("x-ratelimit-bucket", "abcd1234".parse().unwrap());
    headers
}

async fn record_auth(state: &TestServerState, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.auth_headers.lock().await.push(value.to_string());
    }
}

async fn gateway_bot(State(state): State<TestServerState>, headers: HeaderMap) -> Response {
    record_auth(&state, &headers).await;
    (
        rate_limit_headers(),
        Json(json!({"url": "wss://gateway.test", "shards": 1})),
    )
        .into_response()
}

async fn execute_webhook(
    State(state): State<TestServerState>,
    Path((_webhook_id, _token)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers).await;

    if state
        .rate_limits_remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
            remaining.checked_sub(1)
        })
        .is_ok()
    {
        state.rate_limits_served.fetch_add(1, Ordering::SeqCst);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            rate_limit_headers(),
            Json(json!({
                "message": "You are being rate limited.",
                "retry_after": 0.2,
                "global": false,
            })),
        )
            .into_response();
    }

    state
        .webhook_requests
        .lock()
        .await
        .push((query.unwrap_or_default(), body.clone()));

    (
        rate_limit_headers(),
        Json(json!({
            "id": "999",
            "channel_id": "123",
            "content": body.get("content").cloned().unwrap_or(Value::Null),
            "author": {"id": "hook-1", "username": "Relay Hook", "discriminator": "0000"},
        })),
    )
        .into_response()
}

async fn overwrite_commands(
    State(state): State<TestServerState>,
    Path(_application_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers).await;

    let registered: Vec<Value> = body
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, mut command)| {
            command["id"] = json!(format!("cmd-{index}"));
            command
        })
        .collect();

    Json(Value::Array(registered)).into_response()
}

async fn interaction_callback(
    State(state): State<TestServerState>,
    Path((_interaction_id, _token)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    state.interaction_responses.lock().await.push(body);
    StatusCode::NO_CONTENT.into_response()
}

fn create_router(state: TestServerState) -> Router {
    Router::new()
        .route("/api/v10/gateway/bot", get(gateway_bot))
        .route("/api/v10/webhooks/{id}/{token}", post(execute_webhook))
        .route(
            "/api/v10/applications/{id}/commands",
            put(overwrite_commands),
        )
        .route(
            "/api/v10/interactions/{id}/{token}/callback",
            post(interaction_callback),
        )
        .with_state(state)
}

async fn start_server(state: TestServerState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    wait_for_server(addr).await;
    addr
}

async fn wait_for_server(addr: SocketAddr) {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("mock server did not start");
}

fn test_client(addr: SocketAddr) -> DiscordHttpClient {
    let config = DiscordRelayConfig {
        bot_token: "test-token".to_string(),
        base_url_http: Some(format!("http://{addr}/api")),
        ..Default::default()
    };
    DiscordHttpClient::new(&config).unwrap()
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[tokio::test]
async fn test_get_gateway_returns_url_with_authorization() {
    let state = TestServerState::default();
    let addr = start_server(state.clone()).await;
    let client = test_client(addr);

    let gateway = client.get_gateway().await.unwrap();
    assert_eq!(gateway.url, "wss://gateway.test");

    let auth_headers = state.auth_headers.lock().await;
    assert_eq!(auth_headers.as_slice(), ["Bot test-token"]);
}

#[tokio::test]
async fn test_execute_webhook_returns_created_message() {
    let state = TestServerState::default();
    let addr = start_server(state.clone()).await;
    let client = test_client(addr);

    let message = client
        .execute_webhook(
            "1",
            "hook-token",
            None,
            &WebhookMessage::text("player joined").with_username("Steve"),
        )
        .await
        .unwrap();

    assert_eq!(message.id, "999");
    assert_eq!(message.content, "player joined");

    let requests = state.webhook_requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "wait=true");
    assert_eq!(requests[0].1["username"], "Steve");
    assert!(requests[0].1["allowed_mentions"]["parse"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_execute_webhook_thread_id_query() {
    let state = TestServerState::default();
    let addr = start_server(state.clone()).await;
    let client = test_client(addr);

    client
        .execute_webhook("1", "hook-token", Some("777"), &WebhookMessage::text("hi"))
        .await
        .unwrap();

    let requests = state.webhook_requests.lock().await;
    assert_eq!(requests[0].0, "wait=true&thread_id=777");
}

#[tokio::test]
async fn test_rate_limited_request_retries_then_succeeds() {
    let state = TestServerState::default();
    state.rate_limits_remaining.store(1, Ordering::SeqCst);
    let addr = start_server(state.clone()).await;
    let client = test_client(addr);

    let message = client
        .execute_webhook("1", "hook-token", None, &WebhookMessage::text("hello"))
        .await
        .unwrap();

    assert_eq!(message.content, "hello");
    assert_eq!(state.rate_limits_served.load(Ordering::SeqCst), 1);
    assert_eq!(state.webhook_requests.lock().await.len(), 1);
}

#[tokio::test]
async fn test_rate_limit_exhausted_after_three_retries() {
    let state = TestServerState::default();
    state.rate_limits_remaining.store(usize::MAX, Ordering::SeqCst);
    let addr = start_server(state.clone()).await;
    let client = test_client(addr);

    let error = client
        .execute_webhook("1", "hook-token", None, &WebhookMessage::text("hello"))
        .await
        .unwrap_err();

    match error {
        DiscordHttpError::RateLimitExhausted { retries, method, .. } => {
            assert_eq!(retries, 3);
            assert_eq!(method, "POST");
        }
        other => panic!("expected RateLimitExhausted, got {other}"),
    }

    // Initial encounter plus three retries.
    assert_eq!(state.rate_limits_served.load(Ordering::SeqCst), 4);
    assert!(state.webhook_requests.lock().await.is_empty());
}

#[tokio::test]
async fn test_unexpected_status_is_structured() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let router = Router::new().route(
            "/api/v10/gateway/bot",
            get(|| async { (StatusCode::FORBIDDEN, "missing access") }),
        );
        axum::serve(listener, router).await.unwrap();
    });
    wait_for_server(addr).await;

    let client = test_client(addr);
    let error = client.get_gateway().await.unwrap_err();

    match error {
        DiscordHttpError::UnexpectedStatus {
            method,
            url,
            status,
        } => {
            assert_eq!(method, "GET");
            assert_eq!(status, 403);
            assert!(url.ends_with("/gateway/bot"));
        }
        other => panic!("expected UnexpectedStatus, got {other}"),
    }
}

#[tokio::test]
async fn test_respond_to_interaction_accepts_no_content() {
    let state = TestServerState::default();
    let addr = start_server(state.clone()).await;
    let client = test_client(addr);

    client
        .respond_to_interaction("42", "itoken", &InteractionResponse::ephemeral_text("done"))
        .await
        .unwrap();

    let responses = state.interaction_responses.lock().await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["type"], 4);
    assert_eq!(responses[0]["data"]["flags"], 64);
}

#[tokio::test]
async fn test_bulk_overwrite_commands_roundtrip() {
    let state = TestServerState::default();
    let addr = start_server(state.clone()).await;
    let client = test_client(addr);

    let commands = vec![
        ApplicationCommand::chat_input(
            "whitelist",
            "Whitelist a player",
            vec![CommandOption::string("username", "Player username", true)],
        ),
        ApplicationCommand::chat_input("list", "List online players", vec![]),
    ];

    let registered = client
        .bulk_overwrite_commands("app-1", &commands)
        .await
        .unwrap();

    assert_eq!(registered.len(), 2);
    assert_eq!(registered[0].name, "whitelist");
    assert_eq!(registered[0].id.as_deref(), Some("cmd-0"));
    assert_eq!(registered[1].name, "list");
}
