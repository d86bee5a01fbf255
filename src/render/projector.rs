use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;

pub const WALKING: &str = "Walking";
pub const CLEANING: &str = "Cleaning";
pub const IDLE: &str = "Idle";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorClass {
    Idle,
    Walking,
    Cleaning,
    Other,
}

impl ColorClass {
    pub fn for_action(action: &str) -> Self {
        match action {
            WALKING => ColorClass::Walking,
            CLEANING => ColorClass::Cleaning,
            IDLE => ColorClass::Idle,
            _ => ColorClass::Other,
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            ColorClass::Cleaning => "#4ade80",
            ColorClass::Walking => "#60a5fa",
            ColorClass::Idle | ColorClass::Other => "#9ca3af",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualizationState {
    pub position_offset: Vec3,
    pub rotation: f32,
    pub color_class: ColorClass,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectorParams {
    pub amplitude: f32,
    /// Radians per render tick at the nominal frame rate.
    pub spin_increment: f32,
    pub frame_rate_hz: f32,
}

impl Default for ProjectorParams {
    fn default() -> Self {
        (&RenderConfig::default()).into()
    }
}

impl From<&RenderConfig> for ProjectorParams {
    fn from(cfg: &RenderConfig) -> Self {
        Self {
            amplitude: cfg.walk_amplitude,
            spin_increment: cfg.spin_increment,
            frame_rate_hz: cfg.frame_rate_hz as f32,
        }
    }
}

impl ProjectorParams {
    /// Angular velocity in rad/s.
    pub fn spin_rate(&self) -> f32 {
        self.spin_increment * self.frame_rate_hz
    }
}

/// Pure projection of (elapsed time, action) into an animation state.
/// Packet timing never enters here, so jitter on the wire cannot show up
/// on screen.
pub fn project(elapsed_secs: f64, action: &str, params: &ProjectorParams) -> VisualizationState {
    let color_class = ColorClass::for_action(action);
    match action {
        WALKING => VisualizationState {
            position_offset: Vec3::new(elapsed_secs.sin() as f32 * params.amplitude, 0.0, 0.0),
            rotation: 0.0,
            color_class,
        },
        CLEANING => {
            // Wrap in f64 first: large elapsed times lose precision in f32.
            let angle = elapsed_secs * params.spin_rate() as f64;
            let rotation = angle.rem_euclid(TAU as f64) as f32;
            VisualizationState {
                position_offset: Vec3::ZERO,
                rotation: if rotation >= TAU { 0.0 } else { rotation },
                color_class,
            }
        }
        _ => VisualizationState {
            position_offset: Vec3::ZERO,
            rotation: 0.0,
            color_class,
        },
    }
}
