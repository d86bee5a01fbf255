use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::event::TelemetryEvent;
use crate::error::DropKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub packet_stats: PacketStats,
    pub link_stats: LinkStats,
    pub lock_transitions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketStats {
    pub accepted: u64,
    pub dropped_decode: u64,
    pub dropped_invalid: u64,
    pub drop_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    pub connects: u64,
    pub disconnects: u64,
    /// Connects that followed at least one failed attempt or drop.
    pub reconnects: u64,
}

impl PacketStats {
    pub fn dropped(&self) -> u64 {
        self.dropped_decode + self.dropped_invalid
    }
}

/// Window view over whatever events are still held by the recorder.
pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    for event in events {
        apply(&mut snap, event);
    }
    finalize(&mut snap);
    snap
}

pub fn apply(snap: &mut TelemetrySnapshot, event: &TelemetryEvent) {
    match event {
        TelemetryEvent::PacketAccepted { .. } => snap.packet_stats.accepted += 1,
        TelemetryEvent::PacketDropped { kind } => match kind {
            DropKind::Decode => snap.packet_stats.dropped_decode += 1,
            DropKind::InvalidPacket => snap.packet_stats.dropped_invalid += 1,
        },
        TelemetryEvent::LockTransition { .. } => snap.lock_transitions += 1,
        TelemetryEvent::ConnectionLost { .. } => snap.link_stats.disconnects += 1,
        TelemetryEvent::Connected { attempt } => {
            snap.link_stats.connects += 1;
            if *attempt > 0 {
                snap.link_stats.reconnects += 1;
            }
        }
        TelemetryEvent::SessionSummary { .. } => {}
    }
}

pub fn finalize(snap: &mut TelemetrySnapshot) {
    let total = snap.packet_stats.accepted + snap.packet_stats.dropped();
    snap.packet_stats.drop_ratio = if total > 0 {
        snap.packet_stats.dropped() as f64 / total as f64
    } else {
        0.0
    };
}
