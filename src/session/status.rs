use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DropKind;

/// Link state as seen by the observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Constructed, not started.
    Idle,
    /// Initial connect only. Retries after a drop or failure stay
    /// `Disconnected` until one succeeds.
    Connecting { attempt: u32 },
    Connected { session_id: Uuid, endpoint: String },
    /// Transport dropped or connect failed; held through backoff and retries.
    Disconnected { attempt: u32, reason: String },
    /// Stopped by the observer or the reconnect policy gave up.
    Stopped,
}

impl SessionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionStatus::Connected { .. })
    }
}

/// Non-fatal notifications for observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    PacketDropped { kind: DropKind, reason: String },
    LockChanged { locked: bool, action: String },
}
