//! The SMTP session driver: command/response sequencing over one stream.
//!
//! One [`SmtpClient`] owns one connection. Replies on that connection are
//! strictly ordered, so a full MAIL FROM/RCPT TO/DATA transaction holds the
//! session lock end to end; concurrent senders are serialized, never
//! interleaved. `quit` drains submitted sends before saying goodbye.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::sync::{Mutex, Notify};
use tokio::time::timeout;

use crate::config::Timeouts;
use crate::connection::{Connection, Security};
use crate::error::{ClientError, Result};
use crate::message::Message;
use crate::response::Reply;

/// Session lifecycle. Commands check it before touching the wire, so a
/// transaction attempted out of order fails with
/// [`ClientError::InvalidState`] instead of confusing the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connected,
    Greeted,
    Authenticated,
    Closed,
}

#[derive(Debug)]
struct Session {
    connection: Option<Connection>,
    state: SessionState,
}

/// Sends that have been submitted but not yet finished. `quit` waits on
/// `drained` rather than polling the counter.
#[derive(Debug)]
struct SendQueue {
    pending: AtomicUsize,
    drained: Notify,
}

/// Registration of one in-flight send; decrements the counter on drop so
/// failed transactions release their slot too.
struct PendingSend {
    queue: Arc<SendQueue>,
}

impl PendingSend {
    fn register(queue: &Arc<SendQueue>) -> Self {
        queue.pending.fetch_add(1, Ordering::AcqRel);
        Self {
            queue: Arc::clone(queue),
        }
    }
}

impl Drop for PendingSend {
    fn drop(&mut self) {
        if self.queue.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.queue.drained.notify_waiters();
        }
    }
}

/// An SMTP client session over one relay connection.
///
/// Cloning yields another handle to the same session; all handles share the
/// connection, the serialization lock, and the pending-send queue.
#[derive(Debug, Clone)]
pub struct SmtpClient {
    session: Arc<Mutex<Session>>,
    queue: Arc<SendQueue>,
    timeouts: Timeouts,
    local_name: Arc<str>,
}

impl SmtpClient {
    /// Connect to `host:port` with default [`Timeouts`], read the server
    /// greeting, and require a `220` reply.
    ///
    /// # Errors
    /// [`ClientError::Connection`] or [`ClientError::Tls`] when the
    /// transport cannot be established, [`ClientError::UnexpectedReply`]
    /// when the greeting is not a `220`.
    pub async fn connect(host: &str, port: u16, security: Security) -> Result<Self> {
        Self::connect_with(host, port, security, Timeouts::default()).await
    }

    /// Connect with caller-supplied deadlines.
    ///
    /// # Errors
    /// As [`SmtpClient::connect`], plus [`ClientError::Timeout`] when the
    /// connect deadline lapses.
    pub async fn connect_with(
        host: &str,
        port: u16,
        security: Security,
        timeouts: Timeouts,
    ) -> Result<Self> {
        let connection = timeout(timeouts.connect(), Connection::open(host, port, security))
            .await
            .map_err(|_| ClientError::Timeout {
                operation: "connect",
                seconds: timeouts.connect_secs,
            })??;

        let client = Self {
            session: Arc::new(Mutex::new(Session {
                connection: Some(connection),
                state: SessionState::Connected,
            })),
            queue: Arc::new(SendQueue {
                pending: AtomicUsize::new(0),
                drained: Notify::new(),
            }),
            timeouts,
            local_name: Arc::from(gethostname::gethostname().to_string_lossy().as_ref()),
        };

        {
            let mut session = client.session.lock().await;
            let greeting = client.read_reply(&mut session).await?;
            greeting.expect("220")?;
        }
        tracing::debug!(host, port, "connected to relay");

        Ok(client)
    }

    /// Override the local host name announced in EHLO/HELO. Defaults to
    /// the machine's hostname.
    #[must_use]
    pub fn local_name(mut self, name: impl AsRef<str>) -> Self {
        self.local_name = Arc::from(name.as_ref());
        self
    }

    /// Identify to the relay with `EHLO` (extended) or `HELO`; expects `250`.
    ///
    /// # Errors
    /// [`ClientError::UnexpectedReply`] on any other reply code,
    /// [`ClientError::InvalidState`] once the session is closed.
    pub async fn greet(&self, extended: bool) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.state == SessionState::Closed {
            return Err(ClientError::InvalidState("session is closed"));
        }

        let verb = if extended { "EHLO" } else { "HELO" };
        self.exchange(&mut session, &format!("{verb} {}", self.local_name), "250")
            .await?;

        if session.state == SessionState::Connected {
            session.state = SessionState::Greeted;
        }
        Ok(())
    }

    /// Authenticate with the `AUTH LOGIN` mechanism: `334` challenge,
    /// base64 username, `334` challenge, base64 password, `235` acceptance.
    ///
    /// # Errors
    /// [`ClientError::UnexpectedReply`] carrying the server line at
    /// whichever step mismatched; [`ClientError::InvalidState`] before the
    /// greeting or after close.
    pub async fn auth_login(&self, username: &str, password: &str) -> Result<()> {
        let mut session = self.session.lock().await;
        match session.state {
            SessionState::Closed => return Err(ClientError::InvalidState("session is closed")),
            SessionState::Connected => {
                return Err(ClientError::InvalidState("AUTH LOGIN before greeting"))
            }
            SessionState::Greeted | SessionState::Authenticated => {}
        }

        self.exchange(&mut session, "AUTH LOGIN", "334").await?;
        self.exchange(&mut session, &STANDARD.encode(username), "334")
            .await?;
        self.exchange(&mut session, &STANDARD.encode(password), "235")
            .await?;

        session.state = SessionState::Authenticated;
        tracing::debug!("authenticated");
        Ok(())
    }

    /// Run one full send transaction for `message`:
    /// `MAIL FROM` (250), `RCPT TO` (250), `DATA` (354), payload and
    /// terminating dot (250).
    ///
    /// The message is rendered before any bytes hit the wire, so an
    /// incomplete message fails without disturbing the session. The
    /// session lock is held for the whole exchange; concurrent senders on
    /// the same session queue up behind it in FIFO order.
    ///
    /// # Errors
    /// [`ClientError::InvalidState`] when the message has no body kind or
    /// the session is not yet greeted; [`ClientError::UnexpectedReply`] at
    /// whichever protocol step the relay rejected.
    pub async fn send_message(&self, message: &Message) -> Result<()> {
        let payload = message.render()?;

        let _pending = PendingSend::register(&self.queue);
        let mut session = self.session.lock().await;
        self.transact(&mut session, &message.from, &message.to, &payload)
            .await
    }

    /// Submit `message` on an independent task.
    ///
    /// The send is registered before this returns, so a subsequent
    /// [`SmtpClient::quit`] waits for it. `on_complete` is invoked exactly
    /// once with the outcome, success or failure.
    pub fn send_message_detached<F>(&self, message: Message, on_complete: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let client = self.clone();
        let pending = PendingSend::register(&self.queue);

        tokio::spawn(async move {
            let result = async {
                let payload = message.render()?;
                let mut session = client.session.lock().await;
                client
                    .transact(&mut session, &message.from, &message.to, &payload)
                    .await
            }
            .await;

            if let Err(error) = &result {
                tracing::warn!(%error, "detached send failed");
            }
            drop(pending);
            on_complete(result);
        });
    }

    /// Wait for every submitted send to finish, send `QUIT` (expect `221`),
    /// and close the stream.
    ///
    /// The stream is shut down and the session marked closed even when the
    /// `221` check or the write fails; the protocol outcome is surfaced
    /// after the close.
    ///
    /// # Errors
    /// [`ClientError::UnexpectedReply`] when the relay does not answer
    /// `221`, [`ClientError::InvalidState`] when already closed.
    pub async fn quit(&self) -> Result<()> {
        loop {
            let drained = self.queue.drained.notified();
            tokio::pin!(drained);
            // Register for the wakeup before re-checking the counter, or a
            // send finishing in between would be missed.
            drained.as_mut().enable();
            if self.queue.pending.load(Ordering::Acquire) == 0 {
                break;
            }
            drained.await;
        }

        let mut session = self.session.lock().await;
        if session.state == SessionState::Closed {
            return Err(ClientError::InvalidState("session is closed"));
        }

        let farewell = async {
            self.write(&mut session, "QUIT").await?;
            let reply = self.read_reply(&mut session).await?;
            reply.expect("221")
        }
        .await;

        if let Some(mut connection) = session.connection.take() {
            connection.shutdown().await;
        }
        session.state = SessionState::Closed;
        tracing::debug!("session closed");

        farewell
    }

    /// The MAIL FROM/RCPT TO/DATA exchange. Callers hold the session lock.
    async fn transact(
        &self,
        session: &mut Session,
        from: &str,
        to: &str,
        payload: &str,
    ) -> Result<()> {
        match session.state {
            SessionState::Closed => return Err(ClientError::InvalidState("session is closed")),
            SessionState::Connected => {
                return Err(ClientError::InvalidState("send before greeting"))
            }
            SessionState::Greeted | SessionState::Authenticated => {}
        }

        self.exchange(session, &format!("MAIL FROM: {from}"), "250")
            .await?;
        self.exchange(session, &format!("RCPT TO: {to}"), "250")
            .await?;
        self.exchange(session, "DATA", "354").await?;

        self.write(session, payload).await?;
        self.write(session, "\r\n.\r\n").await?;
        let reply = self.read_reply(session).await?;
        reply.expect("250")?;

        tracing::debug!(from, to, bytes = payload.len(), "message accepted");
        Ok(())
    }

    /// Write `command`, read one reply line, and require `expected`.
    async fn exchange(
        &self,
        session: &mut Session,
        command: &str,
        expected: &'static str,
    ) -> Result<Reply> {
        self.write(session, command).await?;
        let reply = self.read_reply(session).await?;
        reply.expect(expected)?;
        Ok(reply)
    }

    /// Write raw text, appending CRLF when it is not already present.
    async fn write(&self, session: &mut Session, data: &str) -> Result<()> {
        let connection = session
            .connection
            .as_mut()
            .ok_or(ClientError::InvalidState("session is closed"))?;

        let mut bytes = Vec::with_capacity(data.len() + 2);
        bytes.extend_from_slice(data.as_bytes());
        if !data.ends_with("\r\n") {
            bytes.extend_from_slice(b"\r\n");
        }

        timeout(self.timeouts.write(), connection.send(&bytes))
            .await
            .map_err(|_| ClientError::Timeout {
                operation: "write",
                seconds: self.timeouts.write_secs,
            })??;
        tracing::trace!(bytes = bytes.len(), "wrote");
        Ok(())
    }

    /// Read one reply line byte by byte, up to and including the `\n`.
    /// A line cut short by end of stream is returned as accumulated.
    async fn read_reply(&self, session: &mut Session) -> Result<Reply> {
        let connection = session
            .connection
            .as_mut()
            .ok_or(ClientError::InvalidState("session is closed"))?;

        let line = timeout(self.timeouts.read(), async {
            let mut line = Vec::new();
            loop {
                match connection.read_byte().await? {
                    Some(byte) => {
                        line.push(byte);
                        if byte == b'\n' {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Ok::<_, ClientError>(line)
        })
        .await
        .map_err(|_| ClientError::Timeout {
            operation: "read reply",
            seconds: self.timeouts.read_secs,
        })??;

        let reply = Reply::new(String::from_utf8_lossy(&line).into_owned());
        tracing::trace!(line = reply.line().trim_end(), "read reply");
        Ok(reply)
    }
}
