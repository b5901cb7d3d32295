//! Hand landmark layout
//!
//! Detections arrive as 21 normalized points per hand, indexed the way the
//! MediaPipe hand model lays them out. Gameplay only reads the index
//! fingertip; the rest ride along for renderers that draw the skeleton.

use glam::Vec2;

/// Points per detected hand
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// The landmark the blade follows
pub const FINGERTIP_INDEX: usize = INDEX_TIP;

/// One detected hand, all coordinates normalized to [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct HandDetection {
    pub landmarks: Vec<Vec2>,
}

impl HandDetection {
    pub fn new(landmarks: Vec<Vec2>) -> Self {
        Self { landmarks }
    }

    /// The tracked fingertip, if the detection carries enough landmarks
    pub fn fingertip(&self) -> Option<Vec2> {
        self.landmarks.get(FINGERTIP_INDEX).copied()
    }

    /// Synthetic hand clustered around `tip`; demo and test helper
    pub fn around_fingertip(tip: Vec2) -> Self {
        let mut landmarks = vec![tip; LANDMARK_COUNT];
        for (i, lm) in landmarks.iter_mut().enumerate() {
            if i != FINGERTIP_INDEX {
                let off = i as f32 * 0.003;
                *lm += Vec2::new(off * 0.5, off);
            }
        }
        Self { landmarks }
    }
}
