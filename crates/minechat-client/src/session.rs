//! Transport session: one TCP connection, scoped.

use futures_util::future::BoxFuture;
use minechat_core::ChatError;
use minechat_core::codec::{decode_line, encode_line};
use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Host and port of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A line reader and a byte writer over one connection.
///
/// Generic so the handshake can be driven over in-memory pipes.
pub struct Session<R = OwnedReadHalf, W = OwnedWriteHalf> {
    reader: BufReader<R>,
    writer: W,
    buf: Vec<u8>,
}

impl Session {
    /// Open a TCP connection. No retry happens here.
    pub async fn connect(endpoint: &Endpoint) -> Result<Self, ChatError> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .inspect_err(|e| tracing::error!(peer = %endpoint, err = %e, "connect failed"))?;
        tracing::debug!(peer = %endpoint, "connected");
        let (reader, writer) = stream.into_split();
        Ok(Self::from_parts(reader, writer))
    }
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn from_parts(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            buf: Vec::with_capacity(1024),
        }
    }

    /// Read one line. A clean EOF means the peer severed the connection.
    pub async fn read_line(&mut self) -> Result<String, ChatError> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 {
            return Err(ChatError::ConnectionClosed);
        }
        Ok(decode_line(&self.buf))
    }

    /// Sanitize, terminate and flush one line.
    pub async fn write_line(&mut self, text: &str) -> Result<(), ChatError> {
        self.writer.write_all(&encode_line(text)).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut the write side down and wait for it to complete.
    pub async fn close(mut self) -> Result<(), ChatError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Run `f` against a fresh session and close it on every exit path.
///
/// On success and on error the writer is shut down before returning. If the
/// returned future is dropped (cancellation) the socket halves are dropped
/// with it, which closes the descriptor.
pub async fn with_session<T, F>(endpoint: &Endpoint, f: F) -> Result<T, ChatError>
where
    F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, ChatError>>,
{
    let mut session = Session::connect(endpoint).await?;
    let result = f(&mut session).await;
    let closed = session.close().await;
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => {
            tracing::warn!(peer = %endpoint, err = %e, "close failed");
            Err(e)
        }
    }
}
