//! Text projection of a fusion snapshot for the presentation layer.
//! Mirrors what the dashboard panels show, without any layout.

use std::fmt;

use serde::Serialize;

use crate::kernel::decision::LockThreshold;
use crate::kernel::fusion::Modality;
use crate::kernel::state::FusionSnapshot;

/// Vision detections above this confidence get the "strong" highlight.
pub const STRONG_VISION_CONF: f64 = 0.8;

const WAITING_LABEL: &str = "Waiting...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub status_line: String,
    pub system_state: String,
    pub locked: bool,
    pub vision: VisionBadge,
    pub audio: Vec<Bar>,
    pub actions: Vec<Bar>,
    /// Share of the living-room bar, 0 - 100.
    pub living_share: f64,
    pub fusion: Option<FusionSummary>,
    pub context_intensities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionBadge {
    pub label: String,
    pub percent: u32,
    pub strong: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub name: String,
    pub prob: f64,
    pub above_threshold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionSummary {
    pub audio_pct: u32,
    pub vision_pct: u32,
    pub location_pct: u32,
    pub dominant: Modality,
    pub dominant_label: String,
}

impl DashboardView {
    pub fn from_snapshot(snapshot: &FusionSnapshot, threshold: LockThreshold) -> Self {
        let locked = snapshot.locked();
        let action = snapshot
            .decision
            .as_ref()
            .map(|d| d.top_action.to_uppercase());

        let status_line = match (&action, locked) {
            (Some(action), true) => format!("LOCKED: {}", action),
            _ => "ANALYZING...".to_string(),
        };
        let system_state = format!(
            "SYSTEM STATE: {}",
            action.as_deref().unwrap_or("WAITING...")
        );

        let (vision, audio, actions, living_share) = match &snapshot.packet {
            Some(packet) => (
                VisionBadge {
                    label: packet.vision.label.clone(),
                    percent: (packet.vision.confidence * 100.0).round() as u32,
                    strong: packet.vision.confidence > STRONG_VISION_CONF,
                },
                packet
                    .audio
                    .top3
                    .iter()
                    .map(|c| Bar {
                        name: c.name.clone(),
                        prob: c.prob,
                        above_threshold: false,
                    })
                    .collect(),
                packet
                    .action
                    .probs
                    .iter()
                    .map(|p| Bar {
                        name: p.name.clone(),
                        prob: p.prob,
                        above_threshold: threshold.is_met(p.prob),
                    })
                    .collect(),
                packet.location.living_prob,
            ),
            None => (
                VisionBadge {
                    label: WAITING_LABEL.to_string(),
                    percent: 0,
                    strong: false,
                },
                Vec::new(),
                Vec::new(),
                50.0,
            ),
        };

        let fusion = snapshot.weights.map(|w| {
            let dominant = w.dominant();
            FusionSummary {
                audio_pct: (w.audio * 100.0).round() as u32,
                vision_pct: (w.vision * 100.0).round() as u32,
                location_pct: (w.location * 100.0).round() as u32,
                dominant,
                dominant_label: format!("{} Dominant", dominant.label()),
            }
        });

        Self {
            status_line,
            system_state,
            locked,
            vision,
            audio,
            actions,
            living_share,
            fusion,
            context_intensities: snapshot.context.iter().map(|f| f.intensity).collect(),
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | vision {} {}%{}",
            self.status_line,
            self.system_state,
            self.vision.label,
            self.vision.percent,
            if self.vision.strong { "*" } else { "" }
        )?;
        if let Some(fusion) = &self.fusion {
            write!(
                f,
                " | fusion A{}/V{}/L{} ({})",
                fusion.audio_pct, fusion.vision_pct, fusion.location_pct, fusion.dominant_label
            )?;
        }
        write!(f, " | context {} frames", self.context_intensities.len())
    }
}
