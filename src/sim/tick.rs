//! Per-frame game orchestration
//!
//! One `tick` advances the whole simulation: clock, spawning, physics,
//! purge and miss penalties, blade collisions with scoring, then the decay
//! of purely visual state. Physics and visuals run in every phase so menu
//! and results screens keep moving; spawning, penalties, and scoring apply
//! only during active, non-preview play.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision;
use super::spawn::Spawner;
use super::state::{EntityKind, GameEvent, GamePhase, GameState, MAX_PARTICLES, Particle};
use crate::Viewport;
use crate::consts;
use crate::tracking::HandSample;
use crate::tuning::Tuning;

/// Everything one tick needs from the outside world
#[derive(Debug, Clone, Copy)]
pub struct TickFrame {
    /// Frame units; 1.0 is one 60 Hz frame
    pub delta: f32,
    /// Freshest filtered hand sample, if a hand is currently tracked
    pub hand: Option<HandSample>,
    pub viewport: Viewport,
}

/// Switch to game over exactly once; later calls change nothing
pub fn trigger_game_over(state: &mut GameState) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.phase = GamePhase::GameOver;
    state.events.push(GameEvent::GameOver {
        score: state.score,
        best_combo: state.best_combo,
    });
    log::info!(
        "game over: score {}, best combo {}",
        state.score,
        state.best_combo
    );
}

pub fn tick(state: &mut GameState, spawner: &mut Spawner, frame: &TickFrame, tuning: &Tuning) {
    state.frames += 1;
    state.clock_ms += frame.delta as f64 * consts::FRAME_MS;

    let active = state.phase == GamePhase::Playing && !state.preview;

    spawner.update(state, frame.delta, tuning, active);
    let missed = spawner.cleanup(&mut state.entities);

    if active && missed > 0 {
        state.lives = state.lives.saturating_sub(missed.min(255) as u8);
        state.combo = 0;
        state.events.push(GameEvent::LivesChanged { lives: state.lives });
        state.events.push(GameEvent::ComboChanged { combo: state.combo });
        log::debug!("{missed} fruit missed, {} lives left", state.lives);
        if state.lives == 0 {
            trigger_game_over(state);
        }
    }

    // The blade: sweep the segment between the previous and current samples.
    // Re-read the phase here; the miss penalty above may just have ended the
    // run, and a dead blade must not keep scoring.
    if state.phase == GamePhase::Playing && !state.preview {
        if let Some(hand) = frame.hand {
            if let Some(prev) = hand.prev_pos {
                let p1 = frame.viewport.to_pixels(prev);
                let p2 = frame.viewport.to_pixels(hand.pos);

                for id in collision::sweep_hits(p1, p2, &state.entities) {
                    let Some(idx) = state.entities.iter().position(|e| e.id == id) else {
                        continue;
                    };
                    match state.entities[idx].kind {
                        EntityKind::Bomb => {
                            // One bomb swallows the rest of the tick: no
                            // further hits, no visual decay this frame
                            state.effects.shake_started_ms = Some(state.clock_ms);
                            state.effects.flash = tuning.flash_strength;
                            burst(&mut state.particles, p2, 0xe74c3c, spawner.rng_mut(), tuning);
                            burst(&mut state.particles, p2, 0xf39c12, spawner.rng_mut(), tuning);
                            state.events.push(GameEvent::BombContact);
                            log::info!("bomb contact at ({:.0}, {:.0})", p2.x, p2.y);
                            return;
                        }
                        EntityKind::Fruit(kind) => {
                            let pos = state.entities[idx].pos;
                            if !state.entities[idx].slice(spawner.rng_mut()) {
                                continue;
                            }
                            burst(
                                &mut state.particles,
                                pos,
                                kind.particle_color(),
                                spawner.rng_mut(),
                                tuning,
                            );

                            let now = state.clock_ms;
                            if now - state.last_slice_ms < tuning.combo_window_ms {
                                state.combo += 1;
                            } else {
                                state.combo = 1;
                            }
                            state.last_slice_ms = now;
                            state.best_combo = state.best_combo.max(state.combo);
                            state.score += tuning.points_per_fruit * state.combo.max(1);
                            state.events.push(GameEvent::ScoreChanged { score: state.score });
                            state.events.push(GameEvent::ComboChanged { combo: state.combo });
                            log::debug!("sliced {kind:?}, combo {}", state.combo);
                        }
                    }
                }
            }
        }
    }

    // Visual decay, all phases
    state.trail.advance();

    for p in &mut state.particles {
        p.vel.x *= 0.98f32.powf(frame.delta);
        p.vel.y += tuning.particle_gravity * frame.delta;
        p.pos += p.vel * frame.delta;
        p.life -= frame.delta;
    }
    state.particles.retain(|p| p.life > 0.0);

    if let Some(started) = state.effects.shake_started_ms {
        let elapsed = state.clock_ms - started;
        if elapsed < tuning.shake_duration_ms {
            let intensity =
                tuning.shake_intensity * (1.0 - (elapsed / tuning.shake_duration_ms) as f32);
            state.effects.shake_offset = Vec2::new(
                (jitter(state.frames, 0) - 0.5) * intensity * 2.0,
                (jitter(state.frames, 1) - 0.5) * intensity * 2.0,
            );
        } else {
            state.effects.shake_offset = Vec2::ZERO;
            state.effects.shake_started_ms = None;
        }
    }

    if state.effects.flash > 0.0 {
        state.effects.flash = (state.effects.flash - tuning.flash_decay * frame.delta).max(0.0);
    }
}

/// Deterministic per-frame noise in [0, 1); keeps the shake jitter off the
/// gameplay RNG stream
fn jitter(frame: u64, salt: u32) -> f32 {
    let h = (frame as u32)
        .wrapping_mul(2654435761)
        .wrapping_add(salt.wrapping_mul(7919));
    (h % 1000) as f32 / 1000.0
}

/// Throw a ring of juice particles from `pos`, recycling the oldest when the
/// pool is full
fn burst(particles: &mut Vec<Particle>, pos: Vec2, color: u32, rng: &mut Pcg32, tuning: &Tuning) {
    for _ in 0..tuning.particles_per_burst {
        if particles.len() >= MAX_PARTICLES {
            particles.remove(0);
        }
        let angle = rng.random::<f32>() * TAU;
        let speed = tuning.particle_speed * (0.4 + rng.random::<f32>() * 0.6);
        particles.push(Particle {
            pos,
            vel: Vec2::new(angle.cos() * speed, angle.sin() * speed - 3.0),
            color,
            life: tuning.particle_lifetime,
            max_life: tuning.particle_lifetime,
            size: 3.0 + rng.random::<f32>() * 5.0,
        });
    }
}
