//! Error types for the SMTP client.

use std::io;

use thiserror::Error;

/// Errors that can occur while driving an SMTP session.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level connect, read, or write failure.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// The TLS handshake failed.
    #[error("TLS handshake failed: {0}")]
    Tls(String),

    /// The server reply did not carry the code expected for the command
    /// just issued. Carries the offending line verbatim.
    #[error("expected reply {expected}, got: {line:?}")]
    UnexpectedReply {
        expected: &'static str,
        line: String,
    },

    /// An operation was attempted in a session state that does not permit
    /// it, or a message was rendered without a body kind.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// An operation did not complete within its configured deadline.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },
}

/// Specialized `Result` type for SMTP client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
