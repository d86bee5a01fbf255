use serde::{Deserialize, Serialize};

use super::decision::DecisionState;
use crate::codec::SensorPacket;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    Audio,
    Vision,
    Location,
}

impl Modality {
    pub fn label(&self) -> &'static str {
        match self {
            Modality::Audio => "Audio",
            Modality::Vision => "Vision",
            Modality::Location => "Location",
        }
    }
}

/// Relative modality contribution for display. Always sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub audio: f32,
    pub vision: f32,
    pub location: f32,
}

impl FusionWeights {
    pub const UNIFORM: FusionWeights = FusionWeights {
        audio: 1.0 / 3.0,
        vision: 1.0 / 3.0,
        location: 1.0 / 3.0,
    };

    /// Scales non-negative raw contributions to sum to 1.0.
    /// Falls back to uniform thirds when nothing contributes.
    pub fn normalized(audio: f32, vision: f32, location: f32) -> Self {
        let audio = audio.max(0.0);
        let vision = vision.max(0.0);
        let location = location.max(0.0);
        let total = audio + vision + location;
        if !total.is_finite() || total <= f32::EPSILON {
            return Self::UNIFORM;
        }
        Self {
            audio: audio / total,
            vision: vision / total,
            location: location / total,
        }
    }

    pub fn sum(&self) -> f32 {
        self.audio + self.vision + self.location
    }

    /// Ties resolve in audio, vision, location order.
    pub fn dominant(&self) -> Modality {
        let mut best = (Modality::Audio, self.audio);
        for candidate in [(Modality::Vision, self.vision), (Modality::Location, self.location)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    }

    pub fn get(&self, modality: Modality) -> f32 {
        match modality {
            Modality::Audio => self.audio,
            Modality::Vision => self.vision,
            Modality::Location => self.location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Constant split, normalized. Default mirrors the dashboard's 60/30/10.
    Fixed { audio: f32, vision: f32, location: f32 },
    /// Strongest audio probability, vision confidence and the stronger room
    /// probability, normalized against each other.
    ConfidenceProportional,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        WeightPolicy::Fixed {
            audio: 0.6,
            vision: 0.3,
            location: 0.1,
        }
    }
}

impl WeightPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let WeightPolicy::Fixed { audio, vision, location } = self {
            let parts = [*audio, *vision, *location];
            if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(ConfigError::Invalid("fixed fusion weights must be finite and >= 0".into()));
            }
            if parts.iter().sum::<f32>() <= f32::EPSILON {
                return Err(ConfigError::Invalid("fixed fusion weights must not all be zero".into()));
            }
        }
        Ok(())
    }
}

/// Pure: same packet and decision always give the same weights.
pub fn aggregate(policy: &WeightPolicy, packet: &SensorPacket, _decision: &DecisionState) -> FusionWeights {
    match policy {
        WeightPolicy::Fixed { audio, vision, location } => {
            FusionWeights::normalized(*audio, *vision, *location)
        }
        WeightPolicy::ConfidenceProportional => {
            let audio = packet.audio.top().map_or(0.0, |c| c.prob);
            let vision = packet.vision.confidence;
            let location = packet.location.living_prob.max(packet.location.kitchen_prob) / 100.0;
            // Display-only, f32 is enough.
            FusionWeights::normalized(audio as f32, vision as f32, location as f32)
        }
    }
}
