pub mod codec;
pub mod config;
pub mod error;
pub mod kernel;
pub mod relay;
pub mod render;
pub mod session;
pub mod view;

// Re-export specific items for convenient access
pub use config::LocusConfig;
pub use kernel::state::{FusionKernel, FusionSnapshot};
pub use session::{LocusSession, SessionHandle};
