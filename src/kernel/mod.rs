pub mod context;
pub mod decision;
pub mod fusion;
pub mod state;
pub mod telemetry;

pub use context::{ContextBuffer, ContextFrame};
pub use decision::{DecisionReducer, DecisionState, LockThreshold, DEFAULT_LOCK_THRESHOLD};
pub use fusion::{aggregate, FusionWeights, Modality, WeightPolicy};
pub use state::{FusionKernel, FusionSnapshot, KernelConfig, StateDelta};
