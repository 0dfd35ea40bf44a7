//! Error types for the protocol layer.

/// Errors that can occur building a request body or extracting the
/// connection grant from a response.
///
/// `#[derive(thiserror::Error)]` auto-generates the `std::error::Error`
/// implementation; the `#[error("...")]` attributes are the messages a
/// caller sees when the handshake reports why it failed.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a request body failed.
    ///
    /// With plain string fields this should never fire, but the codec
    /// boundary reports it rather than assuming.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A field the grant needs is absent from the connect response.
    #[error("connect response is missing field `{0}`")]
    MissingField(&'static str),

    /// A field is present but holds the wrong kind of value
    /// (e.g. a numeric `token`, or a `game_port` that overflows u16).
    #[error("connect response field `{field}` is not {expected}")]
    WrongType {
        /// Which field was malformed.
        field: &'static str,
        /// What the grant expected to find there.
        expected: &'static str,
    },
}
