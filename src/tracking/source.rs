//! Detection sources
//!
//! A `HandSource` produces raw hand detections for a timestamp. The web
//! shell wraps a camera-fed model; tests and the native demo run a scripted
//! source that needs no hardware.

use std::fmt;

use glam::Vec2;

use super::landmarks::HandDetection;

/// A detector that could not produce an answer this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hand source: {}", self.message)
    }
}

impl std::error::Error for SourceError {}

pub trait HandSource {
    /// Detections for the frame at `timestamp_ms`; an empty vec means no
    /// hand was visible
    fn detect(&mut self, timestamp_ms: f64) -> Result<Vec<HandDetection>, SourceError>;
}

/// Deterministic source tracing a slow figure across the screen, with a
/// periodic dropout that exercises the loss-of-tracking path
#[derive(Debug, Default)]
pub struct ScriptedSource;

impl ScriptedSource {
    pub fn new() -> Self {
        Self
    }
}

impl HandSource for ScriptedSource {
    fn detect(&mut self, timestamp_ms: f64) -> Result<Vec<HandDetection>, SourceError> {
        // A short dropout every seven seconds
        if timestamp_ms.rem_euclid(7000.0) < 450.0 {
            return Ok(Vec::new());
        }
        let t = timestamp_ms;
        let x = 0.5 + 0.42 * (t * 0.009).sin();
        let y = 0.52 + 0.22 * (t * 0.0023).sin();
        // Emitted pre-flipped; the filter's mirror lands on the intended path
        Ok(vec![HandDetection::around_fingertip(Vec2::new(
            (1.0 - x) as f32,
            y as f32,
        ))])
    }
}
