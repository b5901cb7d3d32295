//! Fruit Slash - a motion-controlled fruit-slicing arcade game
//!
//! A tracked fingertip is the blade: fruit and bombs arc up from the bottom
//! of the play area, and the swept path of the fingertip between frames cuts
//! whatever it crosses.
//!
//! Core modules:
//! - `sim`: deterministic simulation (spawning, physics, collisions, scoring)
//! - `tracking`: hand-landmark detections -> smoothed pointer + slash signal
//! - `session`: lifecycle, event fan-out, scheduled transitions, teardown
//! - `tuning`: data-driven game balance
//! - `settings`: user preferences (mirroring, reduced motion, ...)
//!
//! Rendering, camera capture, and the hand-landmark model itself live outside
//! this crate; the session exposes plain state for a renderer to draw and
//! consumes plain landmark lists from whatever produced them.

pub mod session;
pub mod settings;
pub mod sim;
pub mod tracking;
pub mod tuning;

pub use session::Session;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Structural constants (gameplay balance lives in [`tuning::Tuning`])
pub mod consts {
    /// Baseline frame duration; a tick delta of 1.0 means one 60 Hz frame
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Largest delta a single update will integrate, so a stalled tab does
    /// not catapult entities across the play area on resume
    pub const MAX_DELTA_FRAMES: f32 = 6.0;

    /// Fallback play-area size for headless runs
    pub const DEFAULT_VIEW_WIDTH: f32 = 1280.0;
    pub const DEFAULT_VIEW_HEIGHT: f32 = 720.0;
}

/// Play-area size in pixels.
///
/// Copied once per tick so a resize arriving mid-frame can never mix an old
/// width with a new height when converting normalized hand coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Map a normalized [0,1]x[0,1] point to play-area pixels
    #[inline]
    pub fn to_pixels(&self, norm: Vec2) -> Vec2 {
        Vec2::new(norm.x * self.width, norm.y * self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(consts::DEFAULT_VIEW_WIDTH, consts::DEFAULT_VIEW_HEIGHT)
    }
}
