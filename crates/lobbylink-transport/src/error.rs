/// Errors that can occur talking to the user service.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Opening a connection to the service failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Writing the request failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading the response failed, or the connection dropped mid-read.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A response arrived but could not be understood at the HTTP level
    /// (bad status line, unreadable headers).
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
