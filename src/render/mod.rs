//! Render domain: projects the latest decision into animation state on an
//! independent clock.

pub mod projector;
pub mod sampler;

pub use projector::{project, ColorClass, ProjectorParams, Vec3, VisualizationState};
pub use sampler::{RenderFrame, RenderSampler};
