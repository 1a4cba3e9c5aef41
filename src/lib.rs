//! A minimal asynchronous SMTP client.
//!
//! Connects to a mail relay (optionally TLS-wrapped), drives the SMTP
//! command/response handshake — greeting, EHLO/HELO, optional AUTH LOGIN,
//! MAIL FROM/RCPT TO/DATA — and transmits messages rendered as flat or
//! multipart MIME bodies with base64-encoded file attachments.
//!
//! Concurrent sends on one session are serialized: replies on an SMTP
//! connection are strictly ordered, so at most one transaction is ever in
//! flight on the wire.
//!
//! # Example
//!
//! ```no_run
//! use courier_smtp::{BodyKind, Message, Security, SmtpClient};
//!
//! # async fn example() -> Result<(), courier_smtp::ClientError> {
//! let client = SmtpClient::connect("relay.example.com", 25, Security::None).await?;
//! client.greet(true).await?;
//!
//! let mut message = Message::new();
//! message.from = "a@x.com".into();
//! message.to = "b@x.com".into();
//! message.subject = "Hi".into();
//! message.body_text = "hello".into();
//! message.kind = Some(BodyKind::Text);
//!
//! client.send_message(&message).await?;
//! client.quit().await?;
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod client;
pub mod config;
mod connection;
pub mod error;
pub mod message;
mod mime;
pub mod response;

pub use attachment::Attachment;
pub use client::SmtpClient;
pub use config::Timeouts;
pub use connection::Security;
pub use error::{ClientError, Result};
pub use message::{BodyKind, Header, Message};
pub use response::Reply;
