use std::sync::Arc;

use tracing::{debug, info};

use super::context::{ContextBuffer, ContextFrame};
use super::decision::{DecisionReducer, DecisionState, LockThreshold};
use super::fusion::{aggregate, FusionWeights, WeightPolicy};
use super::telemetry::{TelemetryEvent, TelemetryRecorder, TelemetrySnapshot};
use crate::codec::SensorPacket;
use crate::config::LocusConfig;
use crate::error::IngestError;

#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub context_capacity: usize,
    pub threshold: LockThreshold,
    pub weights: WeightPolicy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        LocusConfig::default().kernel()
    }
}

impl LocusConfig {
    pub fn kernel(&self) -> KernelConfig {
        KernelConfig {
            context_capacity: self.context_capacity,
            threshold: LockThreshold::new(self.lock_threshold),
            weights: self.fusion.clone(),
        }
    }
}

/// Immutable view published after every accepted packet.
/// `decision == None` means no packet has been accepted yet (awaiting data).
#[derive(Debug, Clone, PartialEq)]
pub struct FusionSnapshot {
    /// Monotonic; bumps on every accepted packet.
    pub version: u64,
    pub decision: Option<DecisionState>,
    pub weights: Option<FusionWeights>,
    pub context: Arc<[ContextFrame]>,
    pub packet: Option<Arc<SensorPacket>>,
    pub telemetry: TelemetrySnapshot,
}

impl FusionSnapshot {
    pub fn awaiting() -> Self {
        Self {
            version: 0,
            decision: None,
            weights: None,
            context: Arc::from(Vec::new()),
            packet: None,
            telemetry: TelemetrySnapshot::default(),
        }
    }

    pub fn is_awaiting_data(&self) -> bool {
        self.decision.is_none()
    }

    pub fn locked(&self) -> bool {
        self.decision.as_ref().map_or(false, |d| d.locked)
    }
}

impl Default for FusionSnapshot {
    fn default() -> Self {
        Self::awaiting()
    }
}

/// Strict state delta. This is the ONLY way kernel state mutates.
#[derive(Debug, Clone)]
pub enum StateDelta {
    PacketAccepted {
        packet: Arc<SensorPacket>,
        decision: DecisionState,
        frame: ContextFrame,
        weights: FusionWeights,
    },
    PacketDropped(IngestError),
    LinkUp { attempt: u32 },
    LinkLost { attempt: u32 },
}

/// Single-writer owner of the context buffer, the last decision and telemetry.
/// Readers only ever see `FusionSnapshot`s.
#[derive(Debug)]
pub struct FusionKernel {
    reducer: DecisionReducer,
    weight_policy: WeightPolicy,
    context: ContextBuffer,
    decision: Option<DecisionState>,
    weights: Option<FusionWeights>,
    packet: Option<Arc<SensorPacket>>,
    telemetry: TelemetryRecorder,
    version: u64,
    seq: u64,
}

impl FusionKernel {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            reducer: DecisionReducer::new(config.threshold),
            weight_policy: config.weights,
            context: ContextBuffer::new(config.context_capacity),
            decision: None,
            weights: None,
            packet: None,
            telemetry: TelemetryRecorder::new(),
            version: 0,
            seq: 0,
        }
    }

    /// Reduce one decoded packet. On error nothing but telemetry changes.
    pub fn ingest(&mut self, packet: SensorPacket) -> Result<Arc<FusionSnapshot>, IngestError> {
        let decision = match self.reducer.reduce(&packet.action.probs) {
            Ok(decision) => decision,
            Err(e) => {
                let err = IngestError::from(e);
                self.reduce(StateDelta::PacketDropped(err.clone()));
                return Err(err);
            }
        };

        let frame = ContextFrame::from_packet(self.seq + 1, &packet);
        let weights = aggregate(&self.weight_policy, &packet, &decision);

        self.reduce(StateDelta::PacketAccepted {
            packet: Arc::new(packet),
            decision,
            frame,
            weights,
        });

        Ok(Arc::new(self.snapshot()))
    }

    /// Record a packet rejected upstream (codec).
    pub fn reject(&mut self, err: IngestError) {
        self.reduce(StateDelta::PacketDropped(err));
    }

    pub fn reduce(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::PacketAccepted { packet, decision, frame, weights } => {
                self.seq = frame.seq;
                self.version += 1;

                let was_locked = self.decision.as_ref().map(|d| d.locked);
                if was_locked != Some(decision.locked) && (decision.locked || was_locked.is_some()) {
                    info!(
                        "Decision {}: {} ({:.2})",
                        if decision.locked { "LOCKED" } else { "released" },
                        decision.top_action,
                        decision.top_prob
                    );
                    self.telemetry.record(TelemetryEvent::LockTransition {
                        seq: frame.seq,
                        locked: decision.locked,
                        action: decision.top_action.clone(),
                    });
                }
                debug!(seq = frame.seq, action = %decision.top_action, prob = decision.top_prob, "packet accepted");

                self.context.push(frame);
                self.decision = Some(decision);
                self.weights = Some(weights);
                self.packet = Some(packet);
                self.telemetry.record(TelemetryEvent::PacketAccepted { seq: frame.seq });
            }
            StateDelta::PacketDropped(err) => {
                self.telemetry.record(TelemetryEvent::PacketDropped { kind: err.kind() });
            }
            StateDelta::LinkUp { attempt } => {
                self.telemetry.record(TelemetryEvent::Connected { attempt });
            }
            StateDelta::LinkLost { attempt } => {
                self.telemetry.record(TelemetryEvent::ConnectionLost { attempt });
            }
        }
    }

    pub fn snapshot(&self) -> FusionSnapshot {
        FusionSnapshot {
            version: self.version,
            decision: self.decision.clone(),
            weights: self.weights,
            context: self.context.snapshot(),
            packet: self.packet.clone(),
            telemetry: self.telemetry.snapshot(),
        }
    }

    // Read-only accessors
    pub fn decision(&self) -> Option<&DecisionState> {
        self.decision.as_ref()
    }

    pub fn context(&self) -> &ContextBuffer {
        &self.context
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn threshold(&self) -> LockThreshold {
        self.reducer.threshold()
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
