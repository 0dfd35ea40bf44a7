//! Transport seam between the handshake and the user service.
//!
//! The handshake only ever does one thing on the network: POST a JSON
//! body to a path and look at the status and body that come back. So
//! that is the whole seam — the [`UserService`] trait. The driver is
//! written against the trait; production code plugs in
//! [`HttpUserService`], tests plug in scripted fakes.
//!
//! # Why a trait?
//!
//! Same reason the session layer puts authentication behind a trait:
//! the interesting logic (sequencing, error mapping, polling) should be
//! testable without sockets, and the wire implementation should be
//! swappable without touching it.

mod error;
mod http;

pub use error::TransportError;
pub use http::HttpUserService;

/// The status code the user service answers with on success. Anything
/// else is a protocol-level failure for that exchange.
pub const STATUS_OK: u16 = 200;

/// A response from the user service: the HTTP status code and the raw
/// body bytes. Interpreting the body is the caller's problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code of the exchange.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// True when the exchange succeeded at the protocol level.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Posts JSON bodies to the user service.
///
/// # Trait bounds
///
/// - `Send + Sync` → the service is moved into the handshake's
///   background task and may be polled from any runtime thread.
/// - `'static` → it owns its data; the task outlives the caller's
///   stack frame, so borrows are off the table.
///
/// The method returns an explicit `impl Future + Send` (rather than
/// `async fn`) so generic callers can spawn the resulting future onto
/// a multi-threaded runtime.
pub trait UserService: Send + Sync + 'static {
    /// Sends `body` to `path` with a POST and returns the status and
    /// response body.
    ///
    /// # Errors
    /// [`TransportError`] if the request could not be sent or no
    /// intelligible response was received. A non-success status is NOT
    /// a transport error — it comes back as a normal [`ApiResponse`].
    fn post(
        &self,
        path: &str,
        body: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<ApiResponse, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_only_for_ok() {
        let ok = ApiResponse {
            status: STATUS_OK,
            body: Vec::new(),
        };
        assert!(ok.is_success());

        for status in [201, 400, 401, 403, 500] {
            let response = ApiResponse {
                status,
                body: Vec::new(),
            };
            assert!(!response.is_success(), "status {status}");
        }
    }
}
