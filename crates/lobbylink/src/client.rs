//! The handshake driver: one background task, two exchanges, one result.
//!
//! The flow is a straight line with early exits:
//!
//! ```text
//! Pending ──start──→ LoggingIn ──OK──→ Connecting ──OK──→ Succeeded
//!                        │                  │
//!                        └──────────────────┴──────────→ Failed
//! ```
//!
//! The caller's thread never blocks: [`HandshakeClient::start`] spawns
//! the task and returns, [`HandshakeClient::is_done`] is a `try_recv`,
//! and the single terminal outcome crosses threads exactly once over a
//! `oneshot` channel. The task owns copies of everything it needs, so
//! a caller that walks away mid-handshake leaves nothing dangling —
//! the task runs to completion and its unobserved result is dropped at
//! the channel.

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use lobbylink_protocol::{
    ClientContext, ConnectionGrant, Credentials, LoginPayload, SessionDescriptor, CONNECT_PATH,
    LOGIN_PATH,
};
use lobbylink_transport::{ApiResponse, UserService};

use crate::{HandshakeError, HandshakeStep};

/// What a finished handshake hands the caller: a grant or the reason
/// there isn't one. Exactly one outcome exists per attempt.
pub type HandshakeOutcome = Result<ConnectionGrant, HandshakeError>;

/// A single login/connect handshake attempt against a user service.
///
/// One instance drives at most one attempt over its lifetime — there
/// is no restart. A caller that wants to retry after a failure builds
/// a fresh client; that keeps "whose result is this?" unambiguous.
///
/// # Usage
///
/// ```rust,ignore
/// let mut client = HandshakeClient::start(service, credentials, context);
/// loop {
///     // ... render a frame ...
///     if client.is_done() {
///         match client.take_result() {
///             Ok(grant) => { /* advance to the connecting phase */ }
///             Err(e) => { /* log, fall back to the menu */ }
///         }
///         break;
///     }
/// }
/// ```
pub struct HandshakeClient {
    state: PollState,
}

/// Caller-side view of the handshake.
///
/// `InFlight` holds the receiving end of the hand-off channel; once
/// the outcome arrives it is parked in `Done` until taken. `Done(None)`
/// means the result has already been handed out.
enum PollState {
    InFlight(oneshot::Receiver<HandshakeOutcome>),
    Done(Option<HandshakeOutcome>),
}

impl HandshakeClient {
    /// Starts the handshake immediately on a background task.
    ///
    /// Never blocks. The task takes ownership of the service,
    /// credentials, and context, so nothing borrowed from the caller
    /// outlives this call. Must be invoked from within a Tokio runtime.
    pub fn start<S: UserService>(
        service: S,
        credentials: Credentials,
        context: ClientContext,
    ) -> Self {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = run_handshake(&service, &credentials, &context).await;
            // A send error means the caller dropped the client before
            // completion; the outcome is simply discarded.
            let _ = outcome_tx.send(outcome);
        });
        Self {
            state: PollState::InFlight(outcome_rx),
        }
    }

    /// Non-blocking completion check, suitable for once-per-frame
    /// polling. Returns `false` until the task reaches a terminal
    /// state, then `true` forever.
    pub fn is_done(&mut self) -> bool {
        let PollState::InFlight(receiver) = &mut self.state else {
            return true;
        };
        match receiver.try_recv() {
            Ok(outcome) => {
                self.state = PollState::Done(Some(outcome));
                true
            }
            Err(TryRecvError::Empty) => false,
            // The task vanished without reporting. Terminal, but an
            // error outcome rather than a panic at the poll site.
            Err(TryRecvError::Closed) => {
                self.state = PollState::Done(Some(Err(HandshakeError::TaskAborted)));
                true
            }
        }
    }

    /// Hands the caller the final outcome. Callable exactly once,
    /// and only after [`is_done`](Self::is_done) has returned `true`.
    ///
    /// # Panics
    ///
    /// Panics if the handshake is still in flight or if the result was
    /// already taken — both are caller logic errors, not protocol
    /// failures, so they fail loudly instead of being smoothed over.
    pub fn take_result(&mut self) -> HandshakeOutcome {
        match &mut self.state {
            PollState::Done(outcome) => outcome
                .take()
                .expect("handshake result was already taken"),
            PollState::InFlight(_) => {
                panic!("take_result called before is_done() returned true")
            }
        }
    }
}

/// Runs both exchanges in order. Any failure short-circuits into the
/// terminal error; the connect exchange is never issued unless login
/// succeeded, because its body is derived from the login response.
async fn run_handshake<S: UserService>(
    service: &S,
    credentials: &Credentials,
    context: &ClientContext,
) -> HandshakeOutcome {
    tracing::debug!(username = %credentials.username, "starting login exchange");

    let login_body = LoginPayload::new(credentials).to_bytes()?;
    let response = service
        .post(LOGIN_PATH, login_body)
        .await
        .map_err(|source| HandshakeError::Transport {
            step: HandshakeStep::Login,
            source,
        })?;
    let descriptor: SessionDescriptor = parse_success(HandshakeStep::Login, &response)?;

    tracing::debug!(game_type = %context.game_type, "login accepted, starting connect exchange");

    let connect_body = descriptor.augment(context).to_bytes()?;
    let response = service
        .post(CONNECT_PATH, connect_body)
        .await
        .map_err(|source| HandshakeError::Transport {
            step: HandshakeStep::Connect,
            source,
        })?;
    let fields: Map<String, Value> = parse_success(HandshakeStep::Connect, &response)?;
    let grant = ConnectionGrant::from_response(&fields)?;

    tracing::info!(avatar = %grant.avatar, port = grant.port, "handshake complete");
    Ok(grant)
}

/// Checks the status code, then parses the body. Non-success status
/// wins over an unparseable body: a 401 with an HTML error page is a
/// status failure, not a malformed response.
fn parse_success<T: serde::de::DeserializeOwned>(
    step: HandshakeStep,
    response: &ApiResponse,
) -> Result<T, HandshakeError> {
    if !response.is_success() {
        return Err(HandshakeError::Status {
            step,
            code: response.status,
        });
    }
    serde_json::from_slice(&response.body)
        .map_err(|source| HandshakeError::MalformedResponse { step, source })
}
