use std::sync::Arc;

use ringbuf::traits::{Consumer, Observer, RingBuffer};
use ringbuf::HeapRb;
use serde::{Deserialize, Serialize};

use crate::codec::SensorPacket;

/// One retained summary unit. `intensity` is the packet's strongest action
/// probability (0.0 - 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextFrame {
    pub seq: u64,
    pub intensity: f64,
}

impl ContextFrame {
    pub fn from_packet(seq: u64, packet: &SensorPacket) -> Self {
        let intensity = packet
            .action
            .probs
            .iter()
            .map(|p| p.prob)
            .fold(0.0_f64, f64::max);
        Self { seq, intensity }
    }
}

/// Fixed-capacity FIFO ring of recent frames. Pushing into a full buffer
/// overwrites the oldest frame. Capacity 0 keeps nothing.
pub struct ContextBuffer {
    ring: Option<HeapRb<ContextFrame>>,
}

impl ContextBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: (capacity > 0).then(|| HeapRb::new(capacity)),
        }
    }

    pub fn push(&mut self, frame: ContextFrame) {
        if let Some(ring) = self.ring.as_mut() {
            ring.push_overwrite(frame);
        }
    }

    /// Oldest-first copy of the held frames.
    pub fn snapshot(&self) -> Arc<[ContextFrame]> {
        match &self.ring {
            Some(ring) => ring.iter().copied().collect(),
            None => Arc::from(Vec::new()),
        }
    }

    pub fn latest(&self) -> Option<ContextFrame> {
        self.ring.as_ref().and_then(|ring| ring.iter().last().copied())
    }

    pub fn len(&self) -> usize {
        self.ring.as_ref().map_or(0, |ring| ring.occupied_len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.as_ref().map_or(0, |ring| ring.capacity().get())
    }
}

impl std::fmt::Debug for ContextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
