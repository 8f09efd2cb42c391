// Frame Features Core - perceptual indices for camera-driven sound
// Pure per-frame analysis plus the OSC contract towards the sound engine

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod frame;
pub mod osc;

// Re-exports for convenience
pub use analysis::{FeatureExtractor, FeatureVector, FrameAnalysis};
pub use config::{AnalysisConfig, AppConfig};
pub use error::{AnalysisError, ErrorCode, TransportError};
pub use frame::{Bgr, Frame};
