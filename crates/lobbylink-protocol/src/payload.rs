//! Request-body construction for the two handshake exchanges.
//!
//! Both builders are pure: they read their inputs, produce a new
//! value, and touch nothing else. The handshake driver serializes the
//! results with [`LoginPayload::to_bytes`] / [`ConnectPayload::to_bytes`]
//! just before handing them to the transport.

use serde::Serialize;
use serde_json::Value;

use crate::{ClientContext, Credentials, ProtocolError, SessionDescriptor};

/// Wire name of the context field added to the connect request.
const GAME_TYPE_FIELD: &str = "game_type";

// ---------------------------------------------------------------------------
// LoginPayload
// ---------------------------------------------------------------------------

/// Body of the authentication exchange: `{"username": .., "password": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginPayload {
    username: String,
    password: String,
}

impl LoginPayload {
    /// Builds the login body from the captured credentials.
    ///
    /// No validation beyond presence — empty strings are passed
    /// through unchanged, the server decides what's valid.
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        }
    }

    /// Serializes the body to JSON bytes.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(ProtocolError::Encode)
    }
}

// ---------------------------------------------------------------------------
// ConnectPayload
// ---------------------------------------------------------------------------

/// Body of the connect exchange: the login response forwarded verbatim,
/// with `game_type` inserted (or overwritten, if the service ever
/// started returning one).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConnectPayload(serde_json::Map<String, Value>);

impl SessionDescriptor {
    /// Returns a connect body built from a copy of this descriptor
    /// plus the client context. The descriptor itself is untouched —
    /// it is treated as a value, never mutated in place.
    pub fn augment(&self, context: &ClientContext) -> ConnectPayload {
        let mut fields = self.0.clone();
        fields.insert(
            GAME_TYPE_FIELD.to_owned(),
            Value::String(context.game_type.clone()),
        );
        ConnectPayload(fields)
    }
}

impl ConnectPayload {
    /// Read-only view of the outgoing fields.
    pub fn fields(&self) -> &serde_json::Map<String, Value> {
        &self.0
    }

    /// Serializes the body to JSON bytes.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(ProtocolError::Encode)
    }
}
