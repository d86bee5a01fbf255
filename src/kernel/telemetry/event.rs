use serde::{Deserialize, Serialize};

use crate::error::DropKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    PacketAccepted {
        seq: u64,
    },

    PacketDropped {
        kind: DropKind,
    },

    LockTransition {
        seq: u64,
        locked: bool,
        action: String,
    },

    ConnectionLost {
        attempt: u32,
    },

    Connected {
        attempt: u32,
    },

    // Emitted once on shutdown
    SessionSummary {
        accepted: u64,
        dropped: u64,
        lock_transitions: u64,
        disconnects: u64,
    },
}
