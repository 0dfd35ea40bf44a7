//! Demo: a game-loop-shaped poll of the Lobbylink handshake.
//!
//! Spins up a mock user service on a random localhost port, starts the
//! handshake, and "renders frames" (sleeps ~16ms) while polling
//! `is_done()` — the same shape a real client's menu state would have.
//!
//! The mock service reproduces the real service's observable contract:
//! login checks credentials against its user table (400 unknown user,
//! 403 wrong password), issues a random session id, and connect trades
//! a known session plus a `game_type` for the avatar/token/port grant.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use lobbylink::prelude::*;

// ---------------------------------------------------------------------------
// Mock user service
// ---------------------------------------------------------------------------

struct UserRecord {
    password: String,
    avatar: String,
}

struct ServiceState {
    users: HashMap<String, UserRecord>,
    sessions: Mutex<HashSet<String>>,
    game_port: u16,
}

impl ServiceState {
    fn with_demo_users(game_port: u16) -> Self {
        let mut users = HashMap::new();
        users.insert(
            "alice".to_owned(),
            UserRecord {
                password: "secret".to_owned(),
                avatar: "wolf".to_owned(),
            },
        );
        Self {
            users,
            sessions: Mutex::new(HashSet::new()),
            game_port,
        }
    }
}

/// Random 32-character hex string, used for session ids and tokens.
fn random_hex() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Routes one request and returns (status, body).
fn route(state: &ServiceState, path: &str, body: &Value) -> (u16, Value) {
    match path {
        "/api/v1/login" => {
            let username = body["username"].as_str().unwrap_or_default();
            let password = body["password"].as_str().unwrap_or_default();
            let Some(user) = state.users.get(username) else {
                return (400, Value::Null);
            };
            if user.password != password {
                return (403, Value::Null);
            }
            let session = random_hex();
            state.sessions.lock().unwrap().insert(session.clone());
            (200, json!({"session": session}))
        }
        "/api/v1/connect" => {
            let game_type = body["game_type"].as_str().unwrap_or_default();
            if game_type.is_empty() {
                return (400, Value::Null);
            }
            let session = body["session"].as_str().unwrap_or_default();
            if !state.sessions.lock().unwrap().contains(session) {
                return (401, Value::Null);
            }
            // Every demo session belongs to alice; a real service would
            // look the owner up by session.
            let user = &state.users["alice"];
            (
                200,
                json!({
                    "username": "alice",
                    "avatar": user.avatar,
                    "game_port": state.game_port,
                    "token": random_hex(),
                }),
            )
        }
        _ => (404, Value::Null),
    }
}

async fn handle_request(stream: TcpStream, state: Arc<ServiceState>) -> std::io::Result<()> {
    let mut stream = BufReader::new(stream);

    let mut line = String::new();
    stream.read_line(&mut line).await?;
    let path = line.split_whitespace().nth(1).unwrap_or("").to_owned();

    let mut content_length = 0usize;
    loop {
        line.clear();
        if stream.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    stream.read_exact(&mut body).await?;
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let (status, reply) = route(&state, &path, &body);
    tracing::debug!(path, status, "mock service handled request");

    let reply = reply.to_string();
    let head = format!(
        "HTTP/1.1 {status} {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        reason(status),
        reply.len()
    );
    let writer = stream.get_mut();
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(reply.as_bytes()).await?;
    writer.flush().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        _ => "Not Found",
    }
}

/// Binds the mock service on a random port and serves forever.
async fn start_mock_service(game_port: u16) -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    let state = Arc::new(ServiceState::with_demo_users(game_port));

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_request(stream, state).await {
                            tracing::debug!(error = %e, "request handling failed");
                        }
                    });
                }
                Err(e) => tracing::error!(error = %e, "accept failed"),
            }
        }
    });

    Ok(addr)
}

// ---------------------------------------------------------------------------
// Frame loop
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = start_mock_service(7777).await?;
    tracing::info!(%addr, "mock user service up");

    let service = HttpUserService::new(addr);
    let credentials = Credentials::new("alice", "secret");
    let context = ClientContext::new("arena");

    let mut client = HandshakeClient::start(service, credentials, context);

    let mut frames = 0u32;
    while !client.is_done() {
        frames += 1;
        // One "rendered frame" at ~60fps.
        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    match client.take_result() {
        Ok(grant) => {
            tracing::info!(
                frames,
                avatar = %grant.avatar,
                port = grant.port,
                "handshake complete, ready to join the game server"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(frames, error = %e, "handshake failed, returning to menu");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run_handshake(username: &str, password: &str) -> HandshakeOutcome {
        let addr = start_mock_service(7777).await.unwrap();
        let service = HttpUserService::new(addr);
        let mut client = HandshakeClient::start(
            service,
            Credentials::new(username, password),
            ClientContext::new("arena"),
        );
        for _ in 0..1000 {
            if client.is_done() {
                return client.take_result();
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("handshake never completed");
    }

    #[tokio::test]
    async fn test_end_to_end_success_over_http() {
        let grant = run_handshake("alice", "secret").await.expect("should succeed");
        assert_eq!(grant.avatar, "wolf");
        assert_eq!(grant.port, 7777);
        assert_eq!(grant.token.len(), 32);
    }

    #[tokio::test]
    async fn test_end_to_end_wrong_password_is_login_403() {
        let err = run_handshake("alice", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            HandshakeError::Status {
                step: HandshakeStep::Login,
                code: 403,
            }
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_unknown_user_is_login_400() {
        let err = run_handshake("mallory", "secret").await.unwrap_err();
        assert!(matches!(
            err,
            HandshakeError::Status {
                step: HandshakeStep::Login,
                code: 400,
            }
        ));
    }
}
