//! HTTP/1.1 implementation of [`UserService`] over `tokio::net::TcpStream`.
//!
//! The user service speaks plain HTTP POST with JSON bodies. Two
//! requests per handshake don't justify connection pooling, so this
//! opens a fresh connection per request and sends `Connection: close`.
//! TLS is out of scope — the deployment terminates it in front of the
//! service.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::{ApiResponse, TransportError, UserService};

/// A [`UserService`] reachable over plain HTTP at a host:port address.
#[derive(Debug, Clone)]
pub struct HttpUserService {
    addr: String,
}

impl HttpUserService {
    /// Creates a service client for the given `host:port` address.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// The address this client talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl UserService for HttpUserService {
    async fn post(&self, path: &str, body: Vec<u8>) -> Result<ApiResponse, TransportError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        let mut stream = BufReader::new(stream);

        tracing::debug!(addr = %self.addr, path, bytes = body.len(), "sending request");

        let head = format!(
            "POST {path} HTTP/1.1\r\n\
             Host: {}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n",
            self.addr,
            body.len()
        );
        let writer = stream.get_mut();
        writer
            .write_all(head.as_bytes())
            .await
            .map_err(TransportError::SendFailed)?;
        writer
            .write_all(&body)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)?;

        let mut line = String::new();
        stream
            .read_line(&mut line)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        let status = parse_status_line(&line)?;

        // Headers: all we need is the body length, the rest is skipped.
        let mut content_length: Option<usize> = None;
        loop {
            line.clear();
            let read = stream
                .read_line(&mut line)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if read == 0 {
                return Err(TransportError::InvalidResponse(
                    "connection closed inside headers".into(),
                ));
            }
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                break;
            }
            if let Some((name, value)) = trimmed.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = Some(value.trim().parse().map_err(|_| {
                        TransportError::InvalidResponse(format!(
                            "bad content-length: {}",
                            value.trim()
                        ))
                    })?);
                }
            }
        }

        // With `Connection: close` a missing Content-Length just means
        // "read until the server hangs up".
        let body = match content_length {
            Some(length) => {
                let mut buf = vec![0u8; length];
                stream
                    .read_exact(&mut buf)
                    .await
                    .map_err(TransportError::ReceiveFailed)?;
                buf
            }
            None => {
                let mut buf = Vec::new();
                stream
                    .read_to_end(&mut buf)
                    .await
                    .map_err(TransportError::ReceiveFailed)?;
                buf
            }
        };

        tracing::debug!(path, status, bytes = body.len(), "received response");
        Ok(ApiResponse { status, body })
    }
}

/// Parses `HTTP/1.1 200 OK` into `200`.
fn parse_status_line(line: &str) -> Result<u16, TransportError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => {
            code.parse().map_err(|_| {
                TransportError::InvalidResponse(format!("bad status code: {code}"))
            })
        }
        _ => Err(TransportError::InvalidResponse(format!(
            "bad status line: {:?}",
            line.trim_end()
        ))),
    }
}
