use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::projector::{project, ProjectorParams, Vec3, VisualizationState, IDLE};
use crate::config::RenderConfig;
use crate::kernel::state::FusionSnapshot;

/// Height the model floats at above the floor grid.
const ANCHOR_HEIGHT: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub frame: u64,
    pub elapsed_secs: f64,
    pub action: String,
    /// Base position from the latest packet: (location.x, 0.5, 0).
    pub anchor: Vec3,
    pub state: VisualizationState,
}

impl RenderFrame {
    pub fn initial() -> Self {
        Self::compose(0, 0.0, &FusionSnapshot::awaiting(), false, &ProjectorParams::default())
    }

    /// Pure: which action animates and where it sits, given one snapshot.
    pub fn compose(
        frame: u64,
        elapsed_secs: f64,
        snapshot: &FusionSnapshot,
        require_lock: bool,
        params: &ProjectorParams,
    ) -> Self {
        let action = match &snapshot.decision {
            Some(d) if d.locked || !require_lock => d.top_action.as_str(),
            _ => IDLE,
        };
        let anchor_x = snapshot.packet.as_ref().map_or(0.0, |p| p.location.x as f32);

        Self {
            frame,
            elapsed_secs,
            action: action.to_string(),
            anchor: Vec3::new(anchor_x, ANCHOR_HEIGHT, 0.0),
            state: project(elapsed_secs, action, params),
        }
    }
}

/// Samples the latest snapshot on its own fixed cadence. Never waits on the
/// session: a read is a clone of the current `Arc`.
pub struct RenderSampler {
    snapshots: watch::Receiver<Arc<FusionSnapshot>>,
    frames: watch::Sender<RenderFrame>,
    config: RenderConfig,
    token: CancellationToken,
}

impl RenderSampler {
    pub fn new(
        snapshots: watch::Receiver<Arc<FusionSnapshot>>,
        config: RenderConfig,
        token: CancellationToken,
    ) -> (Self, watch::Receiver<RenderFrame>) {
        let (frames, rx) = watch::channel(RenderFrame::initial());
        (Self { snapshots, frames, config, token }, rx)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let params = ProjectorParams::from(&self.config);
        info!("Render sampler started at {}Hz", self.config.frame_rate_hz);

        let mut cadence = interval(self.config.frame_interval());
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let start = Instant::now();
        let mut frame: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = cadence.tick() => {}
            }

            let snapshot = self.snapshots.borrow().clone();
            let elapsed = start.elapsed().as_secs_f64();
            let next = RenderFrame::compose(frame, elapsed, &snapshot, self.config.require_lock, &params);
            frame += 1;

            // No observers left: nothing to render for.
            if self.frames.send(next).is_err() {
                debug!("Render sampler has no observers");
                break;
            }
        }

        info!("Render sampler stopped after {} frames", frame);
    }
}
