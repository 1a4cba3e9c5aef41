//! The email message data model.

use crate::attachment::Attachment;
use crate::error::Result;
use crate::mime;

/// A custom RFC 2822 header, emitted verbatim in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Which body variants a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Plain text only.
    Text,
    /// HTML only.
    Html,
    /// Both, rendered as a `multipart/alternative` pair.
    TextAndHtml,
}

/// A message submitted over one SMTP transaction.
///
/// Fields are plain data mutated by the caller; rendering never modifies
/// them. `kind` must be set before the message can be rendered or sent.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Envelope and header sender.
    pub from: String,
    /// The single recipient of this message.
    pub to: String,
    /// `Reply-To` header; falls back to `from` when empty.
    pub reply_to: String,
    pub subject: String,
    /// Emits `Disposition-Notification-To` when non-empty.
    pub read_receipt_to: String,
    /// Custom headers, emitted verbatim in insertion order.
    pub headers: Vec<Header>,
    pub body_text: String,
    pub body_html: String,
    /// Which body variants are present. `None` makes rendering fail.
    pub kind: Option<BodyKind>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the complete RFC 2822 message text, MIME structure included.
    ///
    /// Boundary tokens are drawn fresh on every call, so two renders of the
    /// same message are structurally identical but not byte-identical.
    ///
    /// # Errors
    /// [`crate::ClientError::InvalidState`] when `kind` is `None`.
    pub fn render(&self) -> Result<String> {
        mime::render(self, &mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn new_message_is_empty_and_kindless() {
        let message = Message::new();
        assert!(message.from.is_empty());
        assert!(message.headers.is_empty());
        assert!(message.attachments.is_empty());
        assert_eq!(message.kind, None);
    }

    #[test]
    fn render_without_kind_is_invalid_state() {
        let mut message = Message::new();
        message.from = "a@x.com".into();
        message.to = "b@x.com".into();
        message.body_text = "hello".into();

        match message.render() {
            Err(ClientError::InvalidState(_)) => {}
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn header_preserves_name_and_value() {
        let header = Header::new("X-Mailer", "courier");
        assert_eq!(header.name(), "X-Mailer");
        assert_eq!(header.value(), "courier");
    }
}
