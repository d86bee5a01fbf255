use std::time::Duration;

use anyhow::Context;
use locus::config::LocusConfig;
use locus::session::{LocusSession, SessionEvent};
use locus::view::DashboardView;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const RENDER_LOG_EVERY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Config: optional JSON path as first argument, env overrides on top
    let config = match std::env::args().nth(1) {
        Some(path) => LocusConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => LocusConfig::default(),
    }
    .with_env_overrides()?;
    let threshold = config.kernel().threshold;

    tracing::info!("LOCUS dashboard core booting (endpoint {})", config.endpoint.address());

    // 3. Start the scoped session
    let session = LocusSession::new(config)?.start();
    let mut snapshots = session.subscribe_snapshots();
    let mut status = session.subscribe_status();
    let mut events = session.subscribe_events();
    let frames = session.render_frames();

    let mut render_log = tokio::time::interval(RENDER_LOG_EVERY);
    render_log.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!("Dashboard attached. Press Ctrl+C to detach.");

    // 4. Observe until Ctrl+C
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = snapshots.changed() => {
                if changed.is_err() { break; }
                let snapshot = snapshots.borrow_and_update().clone();
                tracing::info!("{}", DashboardView::from_snapshot(&snapshot, threshold));
            }
            changed = status.changed() => {
                if changed.is_err() { break; }
                tracing::info!("Link: {:?}", *status.borrow_and_update());
            }
            event = events.recv() => match event {
                Ok(SessionEvent::PacketDropped { reason, .. }) => tracing::warn!("Packet dropped: {}", reason),
                Ok(SessionEvent::LockChanged { locked, action }) => {
                    tracing::info!("Lock {} on {}", if locked { "acquired" } else { "released" }, action)
                }
                Err(RecvError::Lagged(n)) => tracing::debug!("Missed {} session events", n),
                Err(RecvError::Closed) => break,
            },
            _ = render_log.tick() => {
                let frame = frames.borrow().clone();
                tracing::debug!(
                    "Render frame {}: {} at ({:.2}, {:.2}, {:.2}) rot {:.2} color {}",
                    frame.frame,
                    frame.action,
                    frame.anchor.x + frame.state.position_offset.x,
                    frame.anchor.y + frame.state.position_offset.y,
                    frame.anchor.z + frame.state.position_offset.z,
                    frame.state.rotation,
                    frame.state.color_class.hex()
                );
            }
        }
    }

    // 5. Detach: connection closed, render loop stopped
    if let Some(totals) = session.stop().await {
        tracing::info!(
            "Session totals: accepted={} dropped={} lock_transitions={} reconnects={}",
            totals.packet_stats.accepted,
            totals.packet_stats.dropped(),
            totals.lock_transitions,
            totals.link_stats.reconnects
        );
    }

    Ok(())
}
