use std::collections::VecDeque;

use super::event::TelemetryEvent;
use super::metrics::{apply, compute_snapshot, finalize, TelemetrySnapshot};

const MAX_EVENTS: usize = 10_000;

/// Bounded event ring plus running totals. The ring forgets old events;
/// the totals cover the whole session.
#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
    totals: TelemetrySnapshot,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_EVENTS),
            totals: TelemetrySnapshot::default(),
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        apply(&mut self.totals, &event);
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    /// Session-wide totals.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut snap = self.totals.clone();
        finalize(&mut snap);
        snap
    }

    /// Stats over the retained window only.
    pub fn window_snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.totals = TelemetrySnapshot::default();
    }

    /// Called on shutdown.
    pub fn aggregate_session(&self) -> TelemetryEvent {
        let snap = self.snapshot();
        TelemetryEvent::SessionSummary {
            accepted: snap.packet_stats.accepted,
            dropped: snap.packet_stats.dropped(),
            lock_transitions: snap.lock_transitions,
            disconnects: snap.link_stats.disconnects,
        }
    }
}
