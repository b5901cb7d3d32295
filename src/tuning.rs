//! Game balance knobs
//!
//! Everything a designer would want to retune without touching simulation
//! code. Velocities are in pixels per 60 Hz frame, durations in wall-clock
//! milliseconds of game time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // Physics
    /// Downward acceleration applied to airborne entities and fruit halves
    pub gravity: f32,

    // Spawning
    /// Spawn-delay window at difficulty 1
    pub spawn_delay_min_ms: f64,
    pub spawn_delay_max_ms: f64,
    /// Hard floors the window shrinks toward as difficulty ramps
    pub spawn_delay_min_floor_ms: f64,
    pub spawn_delay_max_floor_ms: f64,
    /// Difficulty gained per frame of active play
    pub difficulty_rate: f32,
    /// Chance a spawn event launches two entities instead of one
    pub double_spawn_chance: f32,
    /// Chance any single launched entity is a bomb
    pub bomb_chance: f32,
    /// Vertical launch speed range for fruit (negative is up)
    pub fruit_launch_vy_min: f32,
    pub fruit_launch_vy_max: f32,
    /// Vertical launch speed range for bombs
    pub bomb_launch_vy_min: f32,
    pub bomb_launch_vy_max: f32,

    // Slashing and scoring
    /// Normalized-space speed per frame above which motion counts as a slash
    pub slash_velocity_threshold: f32,
    pub max_lives: u8,
    /// Base score per fruit, multiplied by the current combo
    pub points_per_fruit: u32,
    /// Slices closer together than this chain the combo
    pub combo_window_ms: f64,

    // Bomb aftermath
    /// Delay between bomb contact and the end of the game
    pub bomb_game_over_delay_ms: f64,
    pub shake_duration_ms: f64,
    /// Shake amplitude in pixels at the moment of contact
    pub shake_intensity: f32,
    /// Screen flash opacity at the moment of contact
    pub flash_strength: f32,
    /// Flash opacity lost per frame
    pub flash_decay: f32,

    // Particles
    pub particles_per_burst: usize,
    /// Base burst speed; individual particles get 40-100% of it
    pub particle_speed: f32,
    /// Particle lifetime in frames
    pub particle_lifetime: f32,
    pub particle_gravity: f32,

    // Countdown
    pub countdown_seconds: u8,
    /// How long the GO flourish stays up before play begins
    pub countdown_go_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.15,

            spawn_delay_min_ms: 1200.0,
            spawn_delay_max_ms: 2500.0,
            spawn_delay_min_floor_ms: 500.0,
            spawn_delay_max_floor_ms: 1000.0,
            difficulty_rate: 0.0005,
            double_spawn_chance: 0.15,
            bomb_chance: 0.12,
            fruit_launch_vy_min: -13.0,
            fruit_launch_vy_max: -9.0,
            bomb_launch_vy_min: -14.0,
            bomb_launch_vy_max: -10.0,

            slash_velocity_threshold: 0.003,
            max_lives: 3,
            points_per_fruit: 10,
            combo_window_ms: 500.0,

            bomb_game_over_delay_ms: 400.0,
            shake_duration_ms: 500.0,
            shake_intensity: 12.0,
            flash_strength: 0.8,
            flash_decay: 0.05,

            particles_per_burst: 18,
            particle_speed: 8.0,
            particle_lifetime: 40.0,
            particle_gravity: 0.3,

            countdown_seconds: 3,
            countdown_go_ms: 800.0,
        }
    }
}

impl Tuning {
    /// Parse overrides from JSON; omitted fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_playable() {
        let t = Tuning::default();
        assert!(t.gravity > 0.0);
        assert!(t.spawn_delay_min_ms < t.spawn_delay_max_ms);
        assert!(t.spawn_delay_min_floor_ms < t.spawn_delay_max_floor_ms);
        assert!(t.fruit_launch_vy_min < t.fruit_launch_vy_max);
        assert!(t.fruit_launch_vy_max < 0.0, "fruit must launch upward");
        assert!(t.bomb_chance + t.double_spawn_chance < 1.0);
        assert!(t.max_lives > 0);
    }

    #[test]
    fn partial_json_overrides_merge_with_defaults() {
        let t = Tuning::from_json(r#"{ "bomb_chance": 0.5, "max_lives": 5 }"#).unwrap();
        assert_eq!(t.bomb_chance, 0.5);
        assert_eq!(t.max_lives, 5);
        assert_eq!(t.points_per_fruit, Tuning::default().points_per_fruit);
    }

    #[test]
    fn bad_json_is_rejected() {
        assert!(Tuning::from_json("{ nope").is_err());
    }
}
