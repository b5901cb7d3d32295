//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame-unit timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{segment_circle_hit, sweep_hits};
pub use spawn::Spawner;
pub use state::{
    EffectState, Entity, EntityKind, Fragment, FruitKind, GameEvent, GamePhase, GameState,
    Particle, TrailState,
};
pub use tick::{TickFrame, tick, trigger_game_over};
