//! # Lobbylink
//!
//! Non-blocking login/connect handshake client for game user services.
//!
//! A game client authenticates in two sequential exchanges: POST the
//! credentials to `/api/v1/login`, forward the returned session
//! descriptor (plus a `game_type`) to `/api/v1/connect`, and receive a
//! [`ConnectionGrant`] — the avatar, session token, and game port the
//! next phase needs. Lobbylink runs both exchanges on a background
//! Tokio task so the game loop can keep rendering while it polls for
//! completion once per frame.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use lobbylink::prelude::*;
//!
//! # async fn example() {
//! let service = HttpUserService::new("users.example.net:3100");
//! let credentials = Credentials::new("alice", "secret");
//! let context = ClientContext::new("arena");
//!
//! let mut client = HandshakeClient::start(service, credentials, context);
//! // each frame:
//! if client.is_done() {
//!     match client.take_result() {
//!         Ok(grant) => println!("connect to port {}", grant.port),
//!         Err(e) => eprintln!("handshake failed: {e}"),
//!     }
//! }
//! # }
//! ```

mod client;
mod error;

pub use client::{HandshakeClient, HandshakeOutcome};
pub use error::{HandshakeError, HandshakeStep};

// Re-export the pieces callers touch so `lobbylink` works standalone.
pub use lobbylink_protocol::{
    ClientContext, ConnectionGrant, Credentials, ProtocolError, SessionDescriptor, CONNECT_PATH,
    LOGIN_PATH,
};
pub use lobbylink_transport::{ApiResponse, HttpUserService, TransportError, UserService};

/// One-line import for the common case.
pub mod prelude {
    pub use crate::{
        ClientContext, ConnectionGrant, Credentials, HandshakeClient, HandshakeError,
        HandshakeOutcome, HandshakeStep, HttpUserService, UserService,
    };
}
