use serde::{Deserialize, Serialize};

/// One multi-modal inference message, already validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPacket {
    pub vision: VisionReading,
    pub audio: AudioReading,
    pub location: LocationReading,
    pub action: ActionReading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionReading {
    pub label: String,
    pub confidence: f64, // 0.0 - 1.0
    pub matrix: Option<Vec<Vec<f32>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioReading {
    /// At most 3 entries, in producer order. Usually best-first, not guaranteed.
    pub top3: Vec<ClassProb>,
}

impl AudioReading {
    /// Highest-probability class; first one wins on ties.
    pub fn top(&self) -> Option<&ClassProb> {
        self.top3.iter().fold(None, |best: Option<&ClassProb>, c| match best {
            Some(b) if b.prob >= c.prob => Some(b),
            _ => Some(c),
        })
    }
}

/// Living / kitchen probabilities are percentages and independent of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    pub living_prob: f64,  // 0.0 - 100.0
    pub kitchen_prob: f64, // 0.0 - 100.0
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReading {
    /// Input order is significant: it decides argmax ties.
    pub probs: Vec<ActionProb>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProb {
    pub name: String,
    pub prob: f64,
}

pub type ActionProb = ClassProb;

impl ClassProb {
    pub fn new(name: impl Into<String>, prob: f64) -> Self {
        Self { name: name.into(), prob }
    }
}

/// `{"event": ..., "data": ...}` wrapper carrying a payload on a named channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}
