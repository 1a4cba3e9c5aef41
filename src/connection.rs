//! Transport streams for SMTP sessions: plain TCP or TLS-wrapped.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error::{ClientError, Result};

/// Whether the stream is TLS-wrapped immediately after connecting.
///
/// SMTPS conventionally lives on port 465, but no port is enforced here;
/// the pairing of port and security is the caller's choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Cleartext TCP.
    #[default]
    None,
    /// TLS from the first byte (no STARTTLS upgrade).
    Tls,
}

/// The byte stream a session owns, either plain TCP or TLS-wrapped.
#[derive(Debug)]
pub(crate) enum Connection {
    Plain(TcpStream),
    Tls(tokio_rustls::client::TlsStream<TcpStream>),
}

impl Connection {
    /// Open a transport to `host:port`, wrapping it in TLS when requested.
    pub(crate) async fn open(host: &str, port: u16, security: Security) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;

        match security {
            Security::None => Ok(Self::Plain(stream)),
            Security::Tls => Self::wrap_tls(stream, host).await,
        }
    }

    /// Wrap an established TCP stream in TLS, verifying against the
    /// platform's native root store.
    async fn wrap_tls(stream: TcpStream, host: &str) -> Result<Self> {
        let mut root_store = RootCertStore::empty();

        let certs = rustls_native_certs::load_native_certs();
        for cert in certs.certs {
            root_store
                .add(cert)
                .map_err(|e| ClientError::Tls(format!("failed to add certificate: {e}")))?;
        }
        if !certs.errors.is_empty() {
            tracing::warn!(?certs.errors, "some native certificates could not be loaded");
        }

        let config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ClientError::Tls(format!("invalid server name: {e}")))?;

        let tls_stream = connector.connect(server_name, stream).await.map_err(|e| {
            // The most common cause of a failed handshake against a mail
            // relay is pointing TLS at a cleartext port.
            ClientError::Tls(format!(
                "{e}; if the relay answered in cleartext the port is likely \
                 wrong, SMTPS conventionally uses port 465"
            ))
        })?;

        Ok(Self::Tls(tls_stream))
    }

    /// Write raw bytes to the stream.
    pub(crate) async fn send(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(stream) => stream.write_all(data).await?,
            Self::Tls(stream) => stream.write_all(data).await?,
        }
        Ok(())
    }

    /// Read a single byte, or `None` once the stream has ended.
    pub(crate) async fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        let n = match self {
            Self::Plain(stream) => stream.read(&mut byte).await?,
            Self::Tls(stream) => stream.read(&mut byte).await?,
        };
        Ok((n == 1).then_some(byte[0]))
    }

    /// Shut the stream down, ignoring errors on an already-dead transport.
    pub(crate) async fn shutdown(&mut self) {
        let _ = match self {
            Self::Plain(stream) => stream.shutdown().await,
            Self::Tls(stream) => stream.shutdown().await,
        };
    }
}
