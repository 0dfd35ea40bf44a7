//! Handshake payloads for the Lobbylink user-service protocol.
//!
//! This crate defines the "language" spoken between the game client and
//! the user service during the login handshake:
//!
//! - **Types** ([`Credentials`], [`ClientContext`], [`SessionDescriptor`],
//!   [`ConnectionGrant`]) — the data that travels through the handshake.
//! - **Payloads** ([`LoginPayload`], [`ConnectPayload`]) — the request
//!   bodies for the two exchanges, built purely from the types above.
//! - **Errors** ([`ProtocolError`]) — what can go wrong encoding a
//!   request or extracting the grant from a response.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the
//! handshake driver (sequencing, polling). It doesn't know about
//! sockets or tasks — it only knows how to build bodies and pick the
//! grant fields out of a response.
//!
//! ```text
//! Transport (bytes) → Protocol (payloads/grant) → Handshake (sequencing)
//! ```

mod error;
mod payload;
mod types;

pub use error::ProtocolError;
pub use payload::{ConnectPayload, LoginPayload};
pub use types::{ClientContext, ConnectionGrant, Credentials, SessionDescriptor};

/// Path of the authentication exchange on the user service.
pub const LOGIN_PATH: &str = "/api/v1/login";

/// Path of the connect exchange on the user service.
pub const CONNECT_PATH: &str = "/api/v1/connect";
