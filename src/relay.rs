//! Fan-out relay. Producers push raw packets, every subscriber receives them
//! wrapped as a named event. The relay does not validate packet contents;
//! that is the subscriber's codec's job.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::encode_envelope;
use crate::config::DEFAULT_CHANNEL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub publish_addr: String,
    pub subscribe_addr: String,
    pub channel: String,
    /// Messages a slow subscriber may fall behind before stale ones are dropped.
    pub buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            publish_addr: "0.0.0.0:8001".to_string(),
            subscribe_addr: "0.0.0.0:8000".to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            buffer: 256,
        }
    }
}

pub struct Relay {
    publishers: TcpListener,
    subscribers: TcpListener,
    channel: Arc<str>,
    tx: broadcast::Sender<Arc<str>>,
}

impl Relay {
    pub async fn bind(config: &RelayConfig) -> std::io::Result<Self> {
        let publishers = TcpListener::bind(&config.publish_addr).await?;
        let subscribers = TcpListener::bind(&config.subscribe_addr).await?;
        let (tx, _) = broadcast::channel(config.buffer.max(1));
        Ok(Self {
            publishers,
            subscribers,
            channel: Arc::from(config.channel.as_str()),
            tx,
        })
    }

    pub fn publish_addr(&self) -> std::io::Result<SocketAddr> {
        self.publishers.local_addr()
    }

    pub fn subscribe_addr(&self) -> std::io::Result<SocketAddr> {
        self.subscribers.local_addr()
    }

    /// Accept loop. Returns when the token is cancelled; per-connection tasks
    /// observe the same token and close their sockets.
    pub async fn run(self, token: CancellationToken) {
        info!(
            "Relay active: publish={:?} subscribe={:?} channel='{}'",
            self.publish_addr().ok(),
            self.subscribe_addr().ok(),
            self.channel
        );

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                accepted = self.publishers.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("Publisher connected: {}", peer);
                        tokio::spawn(publisher(stream, self.channel.clone(), self.tx.clone(), token.clone()));
                    }
                    Err(e) => warn!("Publisher accept failed: {}", e),
                },
                accepted = self.subscribers.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("Subscriber connected: {}", peer);
                        tokio::spawn(subscriber(stream, self.tx.subscribe(), token.clone()));
                    }
                    Err(e) => warn!("Subscriber accept failed: {}", e),
                },
            }
        }

        info!("Relay stopped");
    }
}

async fn publisher(
    stream: TcpStream,
    channel: Arc<str>,
    tx: broadcast::Sender<Arc<str>>,
    token: CancellationToken,
) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        let line = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match serde_json::from_str::<serde_json::Value>(&line) {
                Ok(data) => {
                    let envelope: Arc<str> = Arc::from(encode_envelope(&channel, &data));
                    // No subscribers is fine: the message is simply not seen.
                    let receivers = tx.send(envelope).unwrap_or(0);
                    debug!("Relayed packet to {} subscriber(s)", receivers);
                }
                Err(e) => warn!("Publisher sent non-JSON line: {}", e),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Publisher read failed: {}", e);
                break;
            }
        }
    }
    debug!("Publisher disconnected");
}

async fn subscriber(stream: TcpStream, mut rx: broadcast::Receiver<Arc<str>>, token: CancellationToken) {
    let (read, mut write) = stream.into_split();
    let mut inbound = BufReader::new(read).lines();

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            // Subscribe handshake and anything after it is read and discarded;
            // EOF means the subscriber went away.
            line = inbound.next_line() => match line {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => break,
            },
            message = rx.recv() => match message {
                Ok(message) => {
                    let written = async {
                        write.write_all(message.as_bytes()).await?;
                        write.write_all(b"\n").await
                    }
                    .await;
                    if let Err(e) = written {
                        debug!("Subscriber write failed: {}", e);
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagging, dropped {} stale message(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    let _ = write.shutdown().await;
    debug!("Subscriber disconnected");
}
