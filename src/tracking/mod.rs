//! Hand tracking: landmark layout, smoothing, and detection sources

pub mod filter;
pub mod landmarks;
pub mod source;

pub use filter::{HandSample, PointerFilter};
pub use landmarks::{FINGERTIP_INDEX, HandDetection, LANDMARK_COUNT};
pub use source::{HandSource, ScriptedSource, SourceError};
