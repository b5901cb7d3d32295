//! Fingertip smoothing and slash classification
//!
//! Raw detections jitter frame to frame. The filter mirrors them for
//! natural control, smooths them with a motion-adaptive exponential
//! average, and grades each sample into slash or hover by velocity.

use glam::Vec2;

use super::landmarks::HandDetection;
use crate::consts;

/// Squared displacement above which the filter trusts the new point
const FAST_DISP_SQ: f32 = 0.001;
/// Squared displacement below which the point is treated as standing still
const STILL_DISP_SQ: f32 = 0.0001;
const ALPHA_FAST: f32 = 0.85;
const ALPHA_STILL: f32 = 0.2;
const ALPHA_BASE: f32 = 0.5;

/// One filtered pointer sample, in normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSample {
    /// Mirrored fingertip before smoothing
    pub raw: Vec2,
    /// Smoothed position
    pub pos: Vec2,
    /// Previous smoothed position; `None` right after a snap
    pub prev_pos: Option<Vec2>,
    /// Normalized units per frame
    pub velocity: f32,
    pub slashing: bool,
    pub timestamp_ms: f64,
}

/// Motion-adaptive smoother for the tracked fingertip
#[derive(Debug, Clone)]
pub struct PointerFilter {
    slash_threshold: f32,
    mirror: bool,
    smoothed: Option<Vec2>,
    last_timestamp_ms: f64,
}

impl PointerFilter {
    pub fn new(slash_threshold: f32, mirror: bool) -> Self {
        Self {
            slash_threshold,
            mirror,
            smoothed: None,
            last_timestamp_ms: 0.0,
        }
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        self.mirror = mirror;
    }

    /// Forget the tracked position; the next detection snaps fresh
    pub fn reset(&mut self) {
        self.smoothed = None;
    }

    /// Fold one batch of detections into a sample. An empty batch clears the
    /// filter and yields nothing, so a swipe never bridges a tracking gap.
    pub fn process(
        &mut self,
        detections: &[HandDetection],
        timestamp_ms: f64,
    ) -> Option<HandSample> {
        // Some sources repeat or rewind timestamps; keep ours monotonic
        let timestamp_ms = if timestamp_ms <= self.last_timestamp_ms {
            self.last_timestamp_ms + 1.0
        } else {
            timestamp_ms
        };

        let tips: Vec<Vec2> = detections
            .iter()
            .filter_map(|d| d.fingertip())
            .map(|tip| {
                if self.mirror {
                    Vec2::new(1.0 - tip.x, tip.y)
                } else {
                    tip
                }
            })
            .collect();

        if tips.is_empty() {
            self.reset();
            return None;
        }

        // With several hands in frame, stick to the one nearest our last
        // position instead of flip-flopping between them
        let raw = match self.smoothed {
            Some(prev) if tips.len() > 1 => {
                let mut best = tips[0];
                let mut best_d = prev.distance_squared(best);
                for &tip in &tips[1..] {
                    let d = prev.distance_squared(tip);
                    if d < best_d {
                        best = tip;
                        best_d = d;
                    }
                }
                best
            }
            _ => tips[0],
        };

        let dt_ms = timestamp_ms - self.last_timestamp_ms;
        self.last_timestamp_ms = timestamp_ms;

        let sample = match self.smoothed {
            None => {
                self.smoothed = Some(raw);
                HandSample {
                    raw,
                    pos: raw,
                    prev_pos: None,
                    velocity: 0.0,
                    slashing: false,
                    timestamp_ms,
                }
            }
            Some(prev) => {
                let disp_sq = prev.distance_squared(raw);
                let alpha = if disp_sq > FAST_DISP_SQ {
                    ALPHA_FAST
                } else if disp_sq < STILL_DISP_SQ {
                    ALPHA_STILL
                } else {
                    ALPHA_BASE
                };
                let pos = prev + (raw - prev) * alpha;
                self.smoothed = Some(pos);

                let frames = (dt_ms / consts::FRAME_MS) as f32;
                let velocity = if frames > 0.0 {
                    pos.distance(prev) / frames
                } else {
                    0.0
                };

                HandSample {
                    raw,
                    pos,
                    prev_pos: Some(prev),
                    velocity,
                    slashing: velocity > self.slash_threshold,
                    timestamp_ms,
                }
            }
        };

        Some(sample)
    }
}
