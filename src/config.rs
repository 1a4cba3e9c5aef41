//! Deadline configuration for SMTP sessions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-operation deadlines applied to the underlying stream.
///
/// An unresponsive relay would otherwise block a sender forever, so every
/// connect, reply read, and command write runs under one of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timeouts {
    /// Timeout for establishing the connection, TLS handshake included.
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::connect_secs")]
    pub connect_secs: u64,

    /// Timeout for reading a single reply line.
    ///
    /// Default: 300 seconds (5 minutes, per RFC 5321)
    #[serde(default = "defaults::read_secs")]
    pub read_secs: u64,

    /// Timeout for writing a command line or the message payload.
    ///
    /// Default: 60 seconds
    #[serde(default = "defaults::write_secs")]
    pub write_secs: u64,
}

impl Timeouts {
    /// The connect deadline as a [`Duration`].
    #[must_use]
    pub const fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    /// The reply-read deadline as a [`Duration`].
    #[must_use]
    pub const fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    /// The write deadline as a [`Duration`].
    #[must_use]
    pub const fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: defaults::connect_secs(),
            read_secs: defaults::read_secs(),
            write_secs: defaults::write_secs(),
        }
    }
}

mod defaults {
    pub(super) const fn connect_secs() -> u64 {
        30
    }

    pub(super) const fn read_secs() -> u64 {
        300
    }

    pub(super) const fn write_secs() -> u64 {
        60
    }
}
