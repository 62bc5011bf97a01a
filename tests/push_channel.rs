//! End-to-end tests: real server on an ephemeral port, WebSocket client
//! via `tokio-tungstenite`, REST calls via `reqwest`.

#![allow(clippy::panic, missing_docs)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use courier_gateway::api::build_app;
use courier_gateway::app_state::AppState;
use courier_gateway::config::{AccountConfig, GatewayConfig};
use courier_gateway::domain::Role;
use courier_gateway::service::StatusBoard;

const TOKEN: &str = "secret-token";

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(ingest_token: Option<&str>) -> SocketAddr {
    let config = GatewayConfig {
        accounts: vec![
            AccountConfig {
                name: "alice".into(),
                password: "pw".into(),
                role: Role::User,
            },
            AccountConfig {
                name: "bob".into(),
                password: "pw".into(),
                role: Role::User,
            },
        ],
        ingest_token: ingest_token.map(str::to_string),
        ..GatewayConfig::default()
    };
    let state = AppState::new(&config, Arc::new(StatusBoard::new(&config.accounts)));
    let app = build_app(state);

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let Ok((ws, _)) = connect_async(format!("ws://{addr}/async")).await else {
        panic!("ws connect failed");
    };
    ws
}

async fn send(ws: &mut Client, call: Value) {
    let Ok(()) = ws.send(Message::text(call.to_string())).await else {
        panic!("ws send failed");
    };
}

async fn next_frame(ws: &mut Client) -> Value {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(5), ws.next()).await
        else {
            panic!("no frame within timeout");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("frame is not JSON");
            };
            return value;
        }
    }
}

async fn next_of(ws: &mut Client, kind: &str) -> Value {
    loop {
        let frame = next_frame(ws).await;
        if frame["type"] == kind {
            return frame;
        }
    }
}

async fn login(ws: &mut Client, user: &str) {
    send(ws, json!(["login", [user, "pw"]])).await;
    let reply = next_frame(ws).await;
    assert_eq!(reply["type"], "response", "{reply}");
}

async fn publish(addr: SocketAddr, token: Option<&str>, body: Value) -> reqwest::Response {
    let mut request = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/events"))
        .json(&body);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let Ok(response) = request.send().await else {
        panic!("publish request failed");
    };
    response
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let addr = spawn_server(None).await;
    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("health request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let Ok(body) = response.json::<Value>().await else {
        panic!("health body is not JSON");
    };
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn login_start_and_receive_owned_event() {
    let addr = spawn_server(Some(TOKEN)).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    login(&mut alice, "alice").await;
    login(&mut bob, "bob").await;

    send(&mut alice, json!(["setInterval", 0.2])).await;
    send(&mut alice, json!("start")).await;

    let response = publish(
        addr,
        Some(TOKEN),
        json!({ "event": "file_finished", "args": [{ "fid": 7 }], "owner": 1 }),
    )
    .await;
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    let Ok(body) = response.json::<Value>().await else {
        panic!("publish body is not JSON");
    };
    assert_eq!(body["recipients"], 1);

    let event = next_of(&mut alice, "event").await;
    assert_eq!(event["payload"]["eventname"], "file_finished");
    assert_eq!(event["payload"]["event_args"], json!([{ "fid": 7 }]));

    let _ = next_of(&mut alice, "status").await;
    let progress = next_frame(&mut alice).await;
    assert_eq!(progress["type"], "progress");

    let Ok(stats) = reqwest::get(format!("http://{addr}/api/v1/stats")).await else {
        panic!("stats request failed");
    };
    let Ok(stats) = stats.json::<Value>().await else {
        panic!("stats body is not JSON");
    };
    assert_eq!(stats, json!({ "connections": 2, "authenticated": 2, "streaming": 1 }));
}

#[tokio::test]
async fn unauthenticated_client_is_forbidden() {
    let addr = spawn_server(None).await;
    let mut ws = connect(addr).await;
    send(&mut ws, json!("start")).await;
    let reply = next_frame(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 403);

    login(&mut ws, "alice").await;
}

#[tokio::test]
async fn closed_client_leaves_registry() {
    let addr = spawn_server(None).await;
    let mut ws = connect(addr).await;
    login(&mut ws, "alice").await;
    let Ok(()) = ws.close(None).await else {
        panic!("close failed");
    };

    for _ in 0..50 {
        let Ok(stats) = reqwest::get(format!("http://{addr}/api/v1/stats")).await else {
            panic!("stats request failed");
        };
        let Ok(stats) = stats.json::<Value>().await else {
            panic!("stats body is not JSON");
        };
        if stats["connections"] == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("connection was never unregistered");
}

#[tokio::test]
async fn ingest_requires_token() {
    let addr = spawn_server(Some(TOKEN)).await;
    let body = json!({ "event": "package_added" });
    assert_eq!(
        publish(addr, None, body.clone()).await.status(),
        reqwest::StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        publish(addr, Some("wrong"), body.clone()).await.status(),
        reqwest::StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        publish(addr, Some(TOKEN), body).await.status(),
        reqwest::StatusCode::ACCEPTED
    );
}

#[tokio::test]
async fn ingest_route_is_absent_without_token() {
    let addr = spawn_server(None).await;
    let response = publish(addr, Some(TOKEN), json!({ "event": "package_added" })).await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
