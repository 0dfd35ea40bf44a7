//! Unified error type for a failed handshake.

use std::fmt;

use lobbylink_protocol::ProtocolError;
use lobbylink_transport::TransportError;

/// Which of the two exchanges an error happened in.
///
/// Every failure a caller sees names its step, so a login rejection is
/// always distinguishable from a connect rejection by message alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    /// The authentication exchange (`/api/v1/login`).
    Login,
    /// The connect exchange (`/api/v1/connect`).
    Connect,
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeStep::Login => write!(f, "login"),
            HandshakeStep::Connect => write!(f, "connect"),
        }
    }
}

/// Why a handshake ended in the failed state.
///
/// All of these are handled inside the background task and surfaced
/// only through the outcome — nothing escapes as a panic across the
/// polling boundary. Callers mostly just log the message and fall back
/// to the previous menu; the variants exist so tests (and curious
/// callers) can match on the cause.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The request could not be sent or no response was received.
    #[error("{step} request failed: {source}")]
    Transport {
        /// Which exchange failed.
        step: HandshakeStep,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// A response arrived with a non-success status code.
    #[error("{step} rejected with status {code}")]
    Status {
        /// Which exchange was rejected.
        step: HandshakeStep,
        /// The status code the service answered with.
        code: u16,
    },

    /// A response body could not be parsed as a JSON object.
    #[error("{step} response is not a JSON object: {source}")]
    MalformedResponse {
        /// Which exchange produced the body.
        step: HandshakeStep,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// Building a request body or extracting the grant failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The background task went away without reporting an outcome.
    /// Should not happen in practice; mapped to an error rather than a
    /// panic so a polling loop stays well-behaved.
    #[error("handshake task ended without producing a result")]
    TaskAborted,
}
