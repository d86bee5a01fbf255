use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::manager::{SessionChannels, SessionManager};
use super::status::{SessionEvent, SessionStatus};
use super::transport::{Connector, TcpConnector};
use crate::config::LocusConfig;
use crate::error::ConfigError;
use crate::kernel::state::FusionSnapshot;
use crate::kernel::telemetry::TelemetrySnapshot;
use crate::render::{RenderFrame, RenderSampler};

const EVENT_BUFFER: usize = 64;

/// A configured, not yet started session.
pub struct LocusSession<C: Connector = TcpConnector> {
    connector: C,
    config: LocusConfig,
}

impl LocusSession<TcpConnector> {
    pub fn new(config: LocusConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let connector = TcpConnector::new(&config.endpoint);
        Ok(Self { connector, config })
    }
}

impl<C: Connector> LocusSession<C> {
    pub fn with_connector(connector: C, config: LocusConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { connector, config })
    }

    /// Spawns the session and render tasks. Must be called inside a tokio runtime.
    pub fn start(self) -> SessionHandle {
        let token = CancellationToken::new();

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(FusionSnapshot::awaiting()));
        let (status_tx, status_rx) = watch::channel(SessionStatus::Idle);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        let manager = SessionManager::new(
            self.connector,
            &self.config,
            SessionChannels {
                snapshots: snapshot_tx,
                status: status_tx,
                events: events_tx.clone(),
            },
            token.clone(),
        );
        let session_task = tokio::spawn(manager.run());

        let (sampler, frames) =
            RenderSampler::new(snapshot_rx.clone(), self.config.render.clone(), token.child_token());
        let render_task = sampler.spawn();

        SessionHandle {
            token,
            snapshots: snapshot_rx,
            status: status_rx,
            events: events_tx,
            frames,
            session_task: Some(session_task),
            render_task: Some(render_task),
        }
    }
}

/// Scoped ownership of a running session. The connection lives exactly as
/// long as this handle: `stop()` or drop releases it.
pub struct SessionHandle {
    token: CancellationToken,
    snapshots: watch::Receiver<Arc<FusionSnapshot>>,
    status: watch::Receiver<SessionStatus>,
    events: broadcast::Sender<SessionEvent>,
    frames: watch::Receiver<RenderFrame>,
    session_task: Option<JoinHandle<TelemetrySnapshot>>,
    render_task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<FusionSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Arc<FusionSnapshot>> {
        self.snapshots.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn render_frames(&self) -> watch::Receiver<RenderFrame> {
        self.frames.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel both domains, close the connection and wait for the tasks.
    /// Returns the session telemetry totals if the session task finished cleanly.
    pub async fn stop(mut self) -> Option<TelemetrySnapshot> {
        self.token.cancel();

        if let Some(task) = self.render_task.take() {
            if let Err(e) = task.await {
                warn!("Render task ended abnormally: {}", e);
            }
        }

        let totals = match self.session_task.take() {
            Some(task) => match task.await {
                Ok(totals) => Some(totals),
                Err(e) => {
                    warn!("Session task ended abnormally: {}", e);
                    None
                }
            },
            None => None,
        };

        info!("Session detached");
        totals
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
