use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::EndpointConfig;
use crate::error::ConnectionError;

/// Opens one long-lived stream subscribed to a named channel.
pub trait Connector: Send + Sync + 'static {
    type Stream: EventStream;

    fn connect(&self) -> impl Future<Output = Result<Self::Stream, ConnectionError>> + Send;

    /// Human-readable endpoint for logs and status.
    fn endpoint(&self) -> String;
}

/// A live connection yielding one raw message per call.
/// `Ok(None)` means the peer closed the stream cleanly.
pub trait EventStream: Send + 'static {
    fn next_message(&mut self) -> impl Future<Output = Result<Option<String>, ConnectionError>> + Send;
}

/// Newline-delimited JSON over TCP. Writes a single subscribe line on
/// connect, then reads envelopes until EOF.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    channel: String,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(endpoint: &EndpointConfig) -> Self {
        Self {
            addr: endpoint.address(),
            channel: endpoint.channel.clone(),
            connect_timeout: endpoint.connect_timeout(),
        }
    }
}

pub struct TcpEventStream {
    lines: Lines<BufReader<OwnedReadHalf>>,
    // Held so the peer does not see a half-close while we are subscribed.
    _writer: OwnedWriteHalf,
}

impl Connector for TcpConnector {
    type Stream = TcpEventStream;

    async fn connect(&self) -> Result<TcpEventStream, ConnectionError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| ConnectionError::Timeout {
                addr: self.addr.clone(),
                timeout_ms: self.connect_timeout.as_millis() as u64,
            })?
            .map_err(|source| ConnectionError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;

        let (read, mut write) = stream.into_split();
        let subscribe = serde_json::json!({ "subscribe": self.channel }).to_string();
        write.write_all(subscribe.as_bytes()).await?;
        write.write_all(b"\n").await?;
        write.flush().await?;
        debug!("Subscribed to '{}' on {}", self.channel, self.addr);

        Ok(TcpEventStream {
            lines: BufReader::new(read).lines(),
            _writer: write,
        })
    }

    fn endpoint(&self) -> String {
        self.addr.clone()
    }
}

impl EventStream for TcpEventStream {
    async fn next_message(&mut self) -> Result<Option<String>, ConnectionError> {
        loop {
            match self.lines.next_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                other => return Ok(other),
            }
        }
    }
}
