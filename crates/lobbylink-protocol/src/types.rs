//! Core handshake data: who is logging in, what they want to play,
//! what the server said, and what they walk away with.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The username/password pair captured before the handshake starts.
///
/// Immutable by convention: the handshake takes ownership of a copy at
/// start time and nothing mutates it afterwards. No validation happens
/// client-side — empty strings go to the server unchanged, and the
/// server is authoritative on whether they are acceptable.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name presented to the user service.
    pub username: String,
    /// Account password, sent as-is in the login body.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from anything string-like.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Manual `Debug` so the password never ends up in logs or panic
/// messages. Only the username is shown.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ClientContext
// ---------------------------------------------------------------------------

/// Client-supplied context attached to the second exchange.
///
/// The `game_type` is opaque to the client — the user service uses it
/// to pick a game mode and to derive the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Which game mode the client wants to join.
    pub game_type: String,
}

impl ClientContext {
    /// Creates a context for the given game type.
    pub fn new(game_type: impl Into<String>) -> Self {
        Self {
            game_type: game_type.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionDescriptor
// ---------------------------------------------------------------------------

/// The opaque body of a successful login response.
///
/// The user service currently returns `{"session": "<id>"}`, but the
/// client deliberately does not interpret it: whatever fields come
/// back are forwarded verbatim into the connect request (plus
/// `game_type`). That keeps the client compatible if the service adds
/// fields the connect endpoint also keys on.
///
/// `#[serde(transparent)]` makes the newtype serialize exactly like
/// the underlying JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionDescriptor(pub(crate) Map<String, Value>);

impl SessionDescriptor {
    /// Wraps a raw response object. Mostly useful in tests; production
    /// descriptors come from deserializing the login response.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Read-only view of the forwarded fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ConnectionGrant
// ---------------------------------------------------------------------------

/// The final authorization data a successful handshake produces.
///
/// Owned exclusively by the caller once retrieved; the handshake
/// client hands it off and keeps nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionGrant {
    /// Avatar identity the service assigned to this login.
    pub avatar: String,
    /// Session token presented when joining the game server.
    pub token: String,
    /// Port the game server listens on.
    pub port: u16,
}

impl ConnectionGrant {
    /// Extracts the grant from a well-formed connect response body.
    ///
    /// The service replies with more fields than the grant needs
    /// (e.g. `username`); extras are ignored. The wire field for the
    /// port is `game_port`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MissingField`] if `avatar`, `token`, or
    /// `game_port` is absent; [`ProtocolError::WrongType`] if a field
    /// holds the wrong kind of value or the port overflows a `u16`.
    pub fn from_response(body: &Map<String, Value>) -> Result<Self, ProtocolError> {
        Ok(Self {
            avatar: string_field(body, "avatar")?,
            token: string_field(body, "token")?,
            port: port_field(body, "game_port")?,
        })
    }
}

fn string_field(body: &Map<String, Value>, name: &'static str) -> Result<String, ProtocolError> {
    body.get(name)
        .ok_or(ProtocolError::MissingField(name))?
        .as_str()
        .map(str::to_owned)
        .ok_or(ProtocolError::WrongType {
            field: name,
            expected: "a string",
        })
}

fn port_field(body: &Map<String, Value>, name: &'static str) -> Result<u16, ProtocolError> {
    body.get(name)
        .ok_or(ProtocolError::MissingField(name))?
        .as_u64()
        .and_then(|raw| u16::try_from(raw).ok())
        .ok_or(ProtocolError::WrongType {
            field: name,
            expected: "a port number",
        })
}
