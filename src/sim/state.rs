//! Game state and core simulation types
//!
//! Everything the per-tick simulation reads and writes lives here. Positions
//! and velocities are in play-area pixels; velocities are per 60 Hz frame.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Current phase of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Title screen, nothing tracked yet
    Menu,
    /// Camera / detector warm-up
    Loading,
    /// Guide overlay counting down to play; physics runs, spawning does not
    Countdown,
    /// Active gameplay
    Playing,
    /// Run ended; the scene keeps animating behind the results screen
    GameOver,
}

/// The fruit catalog. Radii and colors are fixed per kind; the renderer keys
/// its artwork off the kind name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FruitKind {
    Watermelon,
    Orange,
    Coconut,
    Mango,
    Grape,
}

impl FruitKind {
    pub const ALL: [FruitKind; 5] = [
        FruitKind::Watermelon,
        FruitKind::Orange,
        FruitKind::Coconut,
        FruitKind::Mango,
        FruitKind::Grape,
    ];

    pub fn radius(self) -> f32 {
        match self {
            FruitKind::Watermelon => 45.0,
            FruitKind::Orange => 38.0,
            FruitKind::Coconut => 36.0,
            FruitKind::Mango => 40.0,
            FruitKind::Grape => 32.0,
        }
    }

    /// Rind color (0xRRGGBB)
    pub fn skin_color(self) -> u32 {
        match self {
            FruitKind::Watermelon => 0x2d7d3a,
            FruitKind::Orange => 0xf39c12,
            FruitKind::Coconut => 0x7b5b3a,
            FruitKind::Mango => 0xf1c40f,
            FruitKind::Grape => 0x8e44ad,
        }
    }

    /// Cut-face color shown on sliced halves
    pub fn flesh_color(self) -> u32 {
        match self {
            FruitKind::Watermelon => 0xe74c3c,
            FruitKind::Orange => 0xf5b041,
            FruitKind::Coconut => 0xfdfefe,
            FruitKind::Mango => 0xf9e154,
            FruitKind::Grape => 0xbb8fce,
        }
    }

    /// Juice-splash particle color
    pub fn particle_color(self) -> u32 {
        match self {
            FruitKind::Watermelon => 0xe74c3c,
            FruitKind::Orange => 0xf39c12,
            FruitKind::Coconut => 0xfdfefe,
            FruitKind::Mango => 0xf1c40f,
            FruitKind::Grape => 0x8e44ad,
        }
    }
}

/// What an airborne entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Fruit(FruitKind),
    Bomb,
}

impl EntityKind {
    pub fn is_bomb(self) -> bool {
        matches!(self, EntityKind::Bomb)
    }

    pub fn radius(self) -> f32 {
        match self {
            EntityKind::Fruit(kind) => kind.radius(),
            EntityKind::Bomb => 38.0,
        }
    }
}

/// One half of a sliced fruit, falling and fading independently
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fragment {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// 1.0 at the cut, fades to 0
    pub opacity: f32,
}

/// An airborne fruit or bomb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// Cut by the blade; the body is replaced by its fragments
    pub sliced: bool,
    /// Fell past the bottom without being cut
    pub missed: bool,
    /// Drives the bomb warning pulse; stays 0 for fruit
    pub pulse_phase: f32,
    /// Exactly two halves once sliced, empty before
    pub fragments: Vec<Fragment>,
}

impl Entity {
    pub fn new(id: u32, kind: EntityKind, pos: Vec2, vel: Vec2, rotation_speed: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            vel,
            radius: kind.radius(),
            rotation: 0.0,
            rotation_speed,
            sliced: false,
            missed: false,
            pulse_phase: 0.0,
            fragments: Vec::new(),
        }
    }

    /// Advance one frame of physics.
    ///
    /// An intact body arcs under gravity and is flagged missed once fully
    /// below the play area; a sliced one only animates its two halves.
    pub fn step(&mut self, delta: f32, gravity: f32, play_height: f32) {
        if self.sliced {
            for half in &mut self.fragments {
                half.vel.y += gravity * delta;
                half.pos += half.vel * delta;
                half.rotation += half.rotation_speed * delta;
                half.opacity = (half.opacity - 0.008 * delta).max(0.0);
            }
            return;
        }

        self.vel.y += gravity * delta;
        self.pos += self.vel * delta;
        self.rotation += self.rotation_speed * delta;
        if self.kind.is_bomb() {
            self.pulse_phase += 0.1 * delta;
        }
        if self.pos.y > play_height + self.radius * 2.0 {
            self.missed = true;
        }
    }

    /// Cut the entity in two. Returns false (and changes nothing) for bombs
    /// and for entities already cut, so a double-crossing blade path cannot
    /// score twice.
    pub fn slice(&mut self, rng: &mut Pcg32) -> bool {
        if self.sliced || self.kind.is_bomb() {
            return false;
        }
        self.sliced = true;
        for side in [-1.0f32, 1.0] {
            let lateral = side * (3.0 + rng.random::<f32>() * 2.0);
            self.fragments.push(Fragment {
                pos: self.pos,
                vel: Vec2::new(self.vel.x + lateral, self.vel.y - 2.0),
                rotation: self.rotation,
                rotation_speed: self.rotation_speed + side * 0.08,
                opacity: 1.0,
            });
        }
        true
    }

    /// True once every fragment of a sliced entity has faded out or fallen
    /// well below the play area
    pub fn fragments_spent(&self, play_height: f32) -> bool {
        self.fragments
            .iter()
            .all(|half| half.opacity <= 0.0 || half.pos.y > play_height + 100.0)
    }
}

/// Maximum live juice particles; the oldest are recycled first
pub const MAX_PARTICLES: usize = 256;

/// A juice-splash particle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    /// Frames remaining; alpha is life / max_life
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
}

/// Maximum number of blade-trail points to keep
pub const TRAIL_LENGTH: usize = 50;

/// The glowing ribbon behind the fingertip.
///
/// Points accumulate only while the hand moves fast enough to slash, and the
/// ribbon zips away from the tail when it slows or disappears.
#[derive(Debug, Clone, Default)]
pub struct TrailState {
    /// Oldest first, in play-area pixels
    pub points: Vec<Vec2>,
    slashing: bool,
}

impl TrailState {
    pub fn add_point(&mut self, point: Vec2, slashing: bool) {
        self.slashing = slashing;
        if !slashing {
            return;
        }
        self.points.push(point);
        if self.points.len() > TRAIL_LENGTH {
            self.points.remove(0);
        }
    }

    /// The hand vanished; let the ribbon retract
    pub fn release(&mut self) {
        self.slashing = false;
    }

    /// Per-tick retraction while not slashing
    pub fn advance(&mut self) {
        if self.slashing {
            return;
        }
        for _ in 0..2 {
            if self.points.is_empty() {
                break;
            }
            self.points.remove(0);
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.slashing = false;
    }
}

/// Bomb-aftermath visuals
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectState {
    /// Game-clock instant the current shake started, if one is running
    pub shake_started_ms: Option<f64>,
    /// Pixel offset the renderer should apply to the whole scene this frame
    pub shake_offset: Vec2,
    /// White-out overlay opacity
    pub flash: f32,
}

/// Notifications emitted by the simulation and session, fanned out to every
/// subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ScoreChanged { score: u32 },
    ComboChanged { combo: u32 },
    LivesChanged { lives: u8 },
    /// The blade crossed a bomb; the run ends shortly after
    BombContact,
    CountdownTick { seconds_left: u8 },
    CountdownGo,
    GameOver { score: u32, best_combo: u32 },
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub score: u32,
    /// Current chain of quick slices; 1 for an isolated slice, 0 only before
    /// the first one or after a miss
    pub combo: u32,
    pub best_combo: u32,
    pub lives: u8,
    pub phase: GamePhase,
    /// Physics without consequences: no spawning, scoring, or misses
    pub preview: bool,
    /// Game clock, accumulated from tick deltas (not wall time)
    pub clock_ms: f64,
    /// Clock reading of the most recent scoring slice
    pub last_slice_ms: f64,
    /// Ticks processed since the session was created
    pub frames: u64,
    pub entities: Vec<Entity>,
    pub particles: Vec<Particle>,
    pub trail: TrailState,
    pub effects: EffectState,
    /// Events produced this tick, drained by the session after each update
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    pub fn new(max_lives: u8) -> Self {
        Self {
            score: 0,
            combo: 0,
            best_combo: 0,
            lives: max_lives,
            phase: GamePhase::Menu,
            preview: false,
            clock_ms: 0.0,
            last_slice_ms: 0.0,
            frames: 0,
            entities: Vec::new(),
            particles: Vec::new(),
            trail: TrailState::default(),
            effects: EffectState::default(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a unique entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Wipe one round's progress while the clock keeps counting, so timers
    /// scheduled against it stay monotonic across rounds
    pub fn reset_round(&mut self, max_lives: u8) {
        self.score = 0;
        self.combo = 0;
        self.best_combo = 0;
        self.lives = max_lives;
        self.last_slice_ms = 0.0;
        self.entities.clear();
        self.particles.clear();
        self.trail.clear();
        self.effects = EffectState::default();
        self.events.clear();
    }
}
