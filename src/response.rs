//! SMTP reply lines and reply-code checking.

use crate::error::{ClientError, Result};

/// A single reply line as received from the server, terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    line: String,
}

impl Reply {
    pub(crate) const fn new(line: String) -> Self {
        Self { line }
    }

    /// The raw server line as read from the wire.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    /// The 3-digit status prefix, if the line is long enough to carry one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.line.get(..3)
    }

    /// Check the reply against the code expected for the command just
    /// issued. Exactly the first three characters are compared; anything
    /// else, including a short or empty line, is an
    /// [`ClientError::UnexpectedReply`].
    pub fn expect(&self, expected: &'static str) -> Result<()> {
        if self.code() == Some(expected) {
            Ok(())
        } else {
            Err(ClientError::UnexpectedReply {
                expected,
                line: self.line.trim_end_matches(['\r', '\n']).to_string(),
            })
        }
    }
}
