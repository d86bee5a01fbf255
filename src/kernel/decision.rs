use serde::{Deserialize, Serialize};

use crate::codec::ActionProb;
use crate::error::InvalidPacketError;

/// Probability at or above which the top action counts as locked.
pub const DEFAULT_LOCK_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionState {
    pub top_action: String,
    pub top_prob: f64,
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockThreshold(f64);

impl LockThreshold {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_met(&self, prob: f64) -> bool {
        prob >= self.0
    }
}

impl Default for LockThreshold {
    fn default() -> Self {
        Self(DEFAULT_LOCK_THRESHOLD)
    }
}

/// Stateless argmax + threshold over one packet's action vector.
/// Every call produces a fresh decision; nothing carries over between packets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionReducer {
    threshold: LockThreshold,
}

impl DecisionReducer {
    pub fn new(threshold: LockThreshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> LockThreshold {
        self.threshold
    }

    /// Ties go to the first entry in input order: a later entry only wins
    /// when it is strictly greater.
    pub fn reduce(&self, probs: &[ActionProb]) -> Result<DecisionState, InvalidPacketError> {
        let mut iter = probs.iter();
        let mut best = iter.next().ok_or(InvalidPacketError::EmptyActionProbs)?;
        check_finite(best)?;

        for candidate in iter {
            check_finite(candidate)?;
            if candidate.prob > best.prob {
                best = candidate;
            }
        }

        Ok(DecisionState {
            top_action: best.name.clone(),
            top_prob: best.prob,
            locked: self.threshold.is_met(best.prob),
        })
    }
}

fn check_finite(entry: &ActionProb) -> Result<(), InvalidPacketError> {
    if entry.prob.is_finite() {
        Ok(())
    } else {
        Err(InvalidPacketError::NonFiniteProbability {
            name: entry.name.clone(),
        })
    }
}
