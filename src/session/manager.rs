use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::status::{SessionEvent, SessionStatus};
use super::transport::{Connector, EventStream};
use crate::codec::{decode_envelope, decode_packet};
use crate::config::{LocusConfig, ReconnectPolicy};
use crate::error::{ConnectionError, IngestError};
use crate::kernel::state::{FusionKernel, FusionSnapshot, StateDelta};
use crate::kernel::telemetry::TelemetrySnapshot;

/// Publishing side of the session; the handle keeps the receivers.
pub struct SessionChannels {
    pub snapshots: watch::Sender<Arc<FusionSnapshot>>,
    pub status: watch::Sender<SessionStatus>,
    pub events: broadcast::Sender<SessionEvent>,
}

enum PumpExit {
    Cancelled,
    Lost(ConnectionError),
}

/// Owns the connection lifecycle and is the only writer of kernel state.
/// Messages are handled strictly one at a time, in arrival order.
pub struct SessionManager<C: Connector> {
    connector: C,
    channel: String,
    reconnect: ReconnectPolicy,
    kernel: FusionKernel,
    out: SessionChannels,
    token: CancellationToken,
}

impl<C: Connector> SessionManager<C> {
    pub fn new(connector: C, config: &LocusConfig, out: SessionChannels, token: CancellationToken) -> Self {
        Self {
            connector,
            channel: config.endpoint.channel.clone(),
            reconnect: config.reconnect.clone(),
            kernel: FusionKernel::new(config.kernel()),
            out,
            token,
        }
    }

    /// Connect, pump, reconnect until cancelled or the policy gives up.
    /// Returns the session-wide telemetry totals.
    pub async fn run(mut self) -> TelemetrySnapshot {
        let endpoint = self.connector.endpoint();
        info!("Session starting: {} (channel '{}')", endpoint, self.channel);

        let mut attempt: u32 = 0;

        loop {
            // Retries keep the Disconnected status until a connect succeeds.
            if attempt == 0 {
                self.out.status.send_replace(SessionStatus::Connecting { attempt });
            } else {
                debug!("Reconnect attempt {} to {}", attempt, endpoint);
            }

            let connected = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                result = self.connector.connect() => result,
            };

            let reason = match connected {
                Ok(stream) => {
                    let session_id = Uuid::new_v4();
                    info!(%session_id, "Connected to {}", endpoint);
                    self.kernel.reduce(StateDelta::LinkUp { attempt });
                    self.out.status.send_replace(SessionStatus::Connected {
                        session_id,
                        endpoint: endpoint.clone(),
                    });
                    attempt = 0;

                    match self.pump(stream).await {
                        PumpExit::Cancelled => break,
                        PumpExit::Lost(err) => {
                            warn!(%session_id, "Connection lost: {}", err);
                            err.to_string()
                        }
                    }
                }
                Err(err) => {
                    warn!("Connect attempt {} to {} failed: {}", attempt, endpoint, err);
                    err.to_string()
                }
            };

            attempt = attempt.saturating_add(1);
            self.kernel.reduce(StateDelta::LinkLost { attempt });
            self.out.status.send_replace(SessionStatus::Disconnected { attempt, reason });

            if !self.reconnect.allows(attempt) {
                info!("Reconnect policy exhausted after {} attempt(s)", attempt);
                break;
            }

            let delay = self.reconnect.delay_for(attempt);
            debug!("Reconnecting in {:?}", delay);
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Session stopped: {:?}", self.kernel.telemetry().aggregate_session());
        self.out.status.send_replace(SessionStatus::Stopped);
        self.kernel.telemetry().snapshot()
    }

    async fn pump(&mut self, mut stream: C::Stream) -> PumpExit {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return PumpExit::Cancelled,
                next = stream.next_message() => next,
            };

            match next {
                Ok(Some(message)) => self.handle_message(&message),
                Ok(None) => return PumpExit::Lost(ConnectionError::Closed),
                Err(e) => return PumpExit::Lost(e),
            }
        }
    }

    /// Decode -> reduce -> publish. Any rejection drops this message only.
    pub fn handle_message(&mut self, message: &str) {
        let envelope = match decode_envelope(message) {
            Ok(envelope) => envelope,
            Err(e) => return self.reject(e.into()),
        };

        if envelope.event != self.channel {
            debug!("Ignoring event '{}'", envelope.event);
            return;
        }

        let packet = match decode_packet(&envelope.data) {
            Ok(packet) => packet,
            Err(e) => return self.reject(e.into()),
        };

        let was_locked = self.kernel.decision().map(|d| d.locked);
        match self.kernel.ingest(packet) {
            Ok(snapshot) => {
                // Detached observers must never see another packet.
                if self.token.is_cancelled() {
                    return;
                }
                if let Some(decision) = &snapshot.decision {
                    if was_locked.map_or(decision.locked, |w| w != decision.locked) {
                        let _ = self.out.events.send(SessionEvent::LockChanged {
                            locked: decision.locked,
                            action: decision.top_action.clone(),
                        });
                    }
                }
                self.out.snapshots.send_replace(snapshot);
            }
            Err(e) => self.report_drop(&e),
        }
    }

    fn reject(&mut self, err: IngestError) {
        self.report_drop(&err);
        self.kernel.reject(err);
    }

    fn report_drop(&self, err: &IngestError) {
        warn!("Dropped packet: {}", err);
        let _ = self.out.events.send(SessionEvent::PacketDropped {
            kind: err.kind(),
            reason: err.to_string(),
        });
    }

    pub fn kernel(&self) -> &FusionKernel {
        &self.kernel
    }
}
