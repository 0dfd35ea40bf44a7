//! Integration tests for the handshake driver, using scripted fakes of
//! the user service so every branch is reachable without a network.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Semaphore;

use lobbylink::prelude::*;
use lobbylink::{ApiResponse, TransportError};

// =========================================================================
// Scripted user service
// =========================================================================

/// Replays a fixed script of responses and records every request it
/// receives. Shared interior so the test can inspect the request log
/// after the handshake task (which owns a clone) has finished.
#[derive(Clone)]
struct ScriptedService {
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl ScriptedService {
    fn new(script: Vec<Result<ApiResponse, TransportError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(script.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

impl UserService for ScriptedService {
    async fn post(&self, path: &str, body: Vec<u8>) -> Result<ApiResponse, TransportError> {
        let parsed: Value = serde_json::from_slice(&body).expect("request body is JSON");
        self.requests.lock().unwrap().push((path.to_owned(), parsed));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("request beyond the scripted responses")
    }
}

fn ok(body: Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse {
        status: 200,
        body: serde_json::to_vec(&body).expect("encode scripted body"),
    })
}

fn rejected(status: u16) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse {
        status,
        body: Vec::new(),
    })
}

fn unreachable_service() -> Result<ApiResponse, TransportError> {
    Err(TransportError::ConnectFailed(std::io::Error::other(
        "no route to host",
    )))
}

fn grant_response() -> Value {
    json!({"avatar": "wolf", "token": "tok-123", "game_port": 7777})
}

// =========================================================================
// Helpers
// =========================================================================

fn credentials() -> Credentials {
    Credentials::new("alice", "secret")
}

fn context() -> ClientContext {
    ClientContext::new("arena")
}

/// Polls the client the way a game loop would until it finishes.
async fn finish(client: &mut HandshakeClient) -> HandshakeOutcome {
    for _ in 0..1000 {
        if client.is_done() {
            return client.take_result();
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("handshake never completed");
}

// =========================================================================
// Success path
// =========================================================================

#[tokio::test]
async fn test_successful_handshake_produces_grant() {
    let service = ScriptedService::new(vec![ok(json!({"session": "abc"})), ok(grant_response())]);

    let mut client = HandshakeClient::start(service.clone(), credentials(), context());
    let grant = finish(&mut client).await.expect("handshake should succeed");

    assert_eq!(
        grant,
        ConnectionGrant {
            avatar: "wolf".into(),
            token: "tok-123".into(),
            port: 7777,
        }
    );

    // Exactly two exchanges, in order, with the bodies the service
    // contract prescribes: credentials first, then the login response
    // forwarded with game_type added.
    let requests = service.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, "/api/v1/login");
    assert_eq!(
        requests[0].1,
        json!({"username": "alice", "password": "secret"})
    );
    assert_eq!(requests[1].0, "/api/v1/connect");
    assert_eq!(
        requests[1].1,
        json!({"session": "abc", "game_type": "arena"})
    );
}

#[tokio::test]
async fn test_unknown_descriptor_fields_are_forwarded() {
    let service = ScriptedService::new(vec![
        ok(json!({"session": "abc", "region": "us-west", "ttl": 30})),
        ok(grant_response()),
    ]);

    let mut client = HandshakeClient::start(service.clone(), credentials(), context());
    finish(&mut client).await.expect("handshake should succeed");

    let requests = service.requests();
    assert_eq!(
        requests[1].1,
        json!({"session": "abc", "region": "us-west", "ttl": 30, "game_type": "arena"})
    );
}

// =========================================================================
// Failure mapping
// =========================================================================

#[tokio::test]
async fn test_login_rejection_skips_connect() {
    let service = ScriptedService::new(vec![rejected(401)]);

    let mut client = HandshakeClient::start(service.clone(), credentials(), context());
    let err = finish(&mut client).await.unwrap_err();

    assert!(matches!(
        err,
        HandshakeError::Status {
            step: HandshakeStep::Login,
            code: 401,
        }
    ));
    assert_eq!(err.to_string(), "login rejected with status 401");

    // The second exchange must never have been issued.
    assert_eq!(service.requests().len(), 1);
}

#[tokio::test]
async fn test_connect_rejection_names_the_connect_step() {
    let service = ScriptedService::new(vec![ok(json!({"session": "abc"})), rejected(500)]);

    let mut client = HandshakeClient::start(service.clone(), credentials(), context());
    let err = finish(&mut client).await.unwrap_err();

    assert!(matches!(
        err,
        HandshakeError::Status {
            step: HandshakeStep::Connect,
            code: 500,
        }
    ));
    // Distinguishable from a login-step failure by message alone.
    assert_eq!(err.to_string(), "connect rejected with status 500");
    assert_eq!(service.requests().len(), 2);
}

#[tokio::test]
async fn test_missing_token_is_a_field_error_not_a_crash() {
    let service = ScriptedService::new(vec![
        ok(json!({"session": "abc"})),
        ok(json!({"avatar": "wolf", "game_port": 7777})),
    ]);

    let mut client = HandshakeClient::start(service, credentials(), context());
    let err = finish(&mut client).await.unwrap_err();

    assert!(matches!(
        err,
        HandshakeError::Protocol(lobbylink::ProtocolError::MissingField("token"))
    ));
}

#[tokio::test]
async fn test_malformed_login_body_fails_the_login_step() {
    let service = ScriptedService::new(vec![Ok(ApiResponse {
        status: 200,
        body: b"not json".to_vec(),
    })]);

    let mut client = HandshakeClient::start(service.clone(), credentials(), context());
    let err = finish(&mut client).await.unwrap_err();

    assert!(matches!(
        err,
        HandshakeError::MalformedResponse {
            step: HandshakeStep::Login,
            ..
        }
    ));
    assert_eq!(service.requests().len(), 1);
}

#[tokio::test]
async fn test_transport_failure_on_login() {
    let service = ScriptedService::new(vec![unreachable_service()]);

    let mut client = HandshakeClient::start(service, credentials(), context());
    let err = finish(&mut client).await.unwrap_err();

    assert!(matches!(
        err,
        HandshakeError::Transport {
            step: HandshakeStep::Login,
            ..
        }
    ));
    assert!(err.to_string().starts_with("login request failed"));
}

#[tokio::test]
async fn test_transport_failure_on_connect() {
    let service =
        ScriptedService::new(vec![ok(json!({"session": "abc"})), unreachable_service()]);

    let mut client = HandshakeClient::start(service, credentials(), context());
    let err = finish(&mut client).await.unwrap_err();

    assert!(matches!(
        err,
        HandshakeError::Transport {
            step: HandshakeStep::Connect,
            ..
        }
    ));
}

// =========================================================================
// Polling contract
// =========================================================================

/// Responds by path, but only once the test opens the gate. Lets the
/// test observe the in-flight state for as long as it wants.
#[derive(Clone)]
struct GatedService {
    gate: Arc<Semaphore>,
}

impl UserService for GatedService {
    async fn post(&self, path: &str, _body: Vec<u8>) -> Result<ApiResponse, TransportError> {
        let permit = self.gate.acquire().await.expect("gate dropped");
        permit.forget();
        let body = match path {
            "/api/v1/login" => json!({"session": "abc"}),
            _ => grant_response(),
        };
        ok(body)
    }
}

#[tokio::test]
async fn test_is_done_false_until_complete_then_sticky() {
    let gate = Arc::new(Semaphore::new(0));
    let service = GatedService {
        gate: Arc::clone(&gate),
    };

    let mut client = HandshakeClient::start(service, credentials(), context());

    // While the gate is shut, polling reports false every time.
    for _ in 0..5 {
        assert!(!client.is_done());
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    // Open the gate for both exchanges and let the task finish.
    gate.add_permits(2);
    let grant = finish(&mut client).await.expect("handshake should succeed");
    assert_eq!(grant.port, 7777);

    // Once true, it stays true — even after the result was taken.
    assert!(client.is_done());
    assert!(client.is_done());
}

#[tokio::test]
#[should_panic(expected = "before is_done")]
async fn test_take_result_before_completion_panics() {
    let service = GatedService {
        gate: Arc::new(Semaphore::new(0)),
    };
    let mut client = HandshakeClient::start(service, credentials(), context());
    let _ = client.take_result();
}

#[tokio::test]
#[should_panic(expected = "already taken")]
async fn test_take_result_twice_panics() {
    let service = ScriptedService::new(vec![ok(json!({"session": "abc"})), ok(grant_response())]);
    let mut client = HandshakeClient::start(service, credentials(), context());

    let _ = finish(&mut client).await;
    let _ = client.take_result();
}

#[tokio::test]
async fn test_abandoned_handshake_still_runs_to_completion() {
    let service = ScriptedService::new(vec![ok(json!({"session": "abc"})), ok(grant_response())]);

    let client = HandshakeClient::start(service.clone(), credentials(), context());
    // Caller walks away immediately; the task must finish on its own.
    drop(client);

    for _ in 0..1000 {
        if service.requests().len() == 2 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("background task did not run to completion after abandonment");
}
