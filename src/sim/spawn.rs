//! Entity spawning and the shared physics pass
//!
//! One spawner drives a whole session: it rolls randomized launch delays that
//! shrink as difficulty ramps, throws fruit (and the occasional bomb) up from
//! below the bottom edge with a bias toward the center of the play area, and
//! sweeps spent entities back out of the population.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Entity, EntityKind, FruitKind, GameState};
use crate::Viewport;
use crate::tuning::Tuning;

pub struct Spawner {
    /// Clock reading of the last spawn event; NEG_INFINITY means "never", so
    /// the first active tick always launches something
    last_spawn_ms: f64,
    next_delay_ms: f64,
    /// Starts at 1 and climbs during active play, tightening the delay window
    difficulty: f32,
    viewport: Viewport,
    rng: Pcg32,
}

impl Spawner {
    pub fn new(seed: u64, viewport: Viewport, tuning: &Tuning) -> Self {
        let mut spawner = Self {
            last_spawn_ms: f64::NEG_INFINITY,
            next_delay_ms: 0.0,
            difficulty: 1.0,
            viewport,
            rng: Pcg32::seed_from_u64(seed),
        };
        spawner.next_delay_ms = spawner.roll_delay(tuning);
        spawner
    }

    /// Back to round-start timing; the RNG stream keeps going
    pub fn reset(&mut self, tuning: &Tuning) {
        self.last_spawn_ms = f64::NEG_INFINITY;
        self.difficulty = 1.0;
        self.next_delay_ms = self.roll_delay(tuning);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    /// Gameplay randomness shares one seeded stream; the tick borrows it for
    /// slice impulses and particle bursts
    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Current [min, max) delay window after the difficulty ramp and floors
    pub fn delay_bounds(&self, tuning: &Tuning) -> (f64, f64) {
        let ramp = self.difficulty as f64;
        let min = (tuning.spawn_delay_min_ms - ramp * 20.0).max(tuning.spawn_delay_min_floor_ms);
        let max = (tuning.spawn_delay_max_ms - ramp * 40.0).max(tuning.spawn_delay_max_floor_ms);
        (min, max)
    }

    fn roll_delay(&mut self, tuning: &Tuning) -> f64 {
        let (min, max) = self.delay_bounds(tuning);
        min + self.rng.random::<f64>() * (max - min)
    }

    /// One tick of spawning and physics.
    ///
    /// Physics always advances so the scene never freezes; launching new
    /// entities and ramping difficulty happen only while `spawning` is set
    /// (active, non-preview play).
    pub fn update(&mut self, state: &mut GameState, delta: f32, tuning: &Tuning, spawning: bool) {
        if spawning && state.clock_ms - self.last_spawn_ms > self.next_delay_ms {
            let count = if self.rng.random::<f32>() < tuning.double_spawn_chance {
                2
            } else {
                1
            };
            for _ in 0..count {
                let id = state.next_entity_id();
                let entity = self.launch(id, tuning);
                log::debug!(
                    "spawned {:?} #{id} at x {:.0} (difficulty {:.1})",
                    entity.kind,
                    entity.pos.x,
                    self.difficulty
                );
                state.entities.push(entity);
            }
            self.last_spawn_ms = state.clock_ms;
            self.next_delay_ms = self.roll_delay(tuning);
        }

        for entity in &mut state.entities {
            entity.step(delta, tuning.gravity, self.viewport.height);
        }

        if spawning {
            self.difficulty += tuning.difficulty_rate * delta;
        }
    }

    fn launch(&mut self, id: u32, tuning: &Tuning) -> Entity {
        let kind = if self.rng.random::<f32>() < tuning.bomb_chance {
            EntityKind::Bomb
        } else {
            EntityKind::Fruit(FruitKind::ALL[self.rng.random_range(0..FruitKind::ALL.len())])
        };

        let radius = kind.radius();
        let x = self.viewport.width * self.rng.random_range(0.15..0.85);
        let pos = Vec2::new(x, self.viewport.height + radius);

        // Bias the throw toward the center: edge spawns arc inward
        let center_x = self.viewport.width * 0.5;
        let center_pull = (center_x - x) / center_x;
        let vx = center_pull * 2.0 + (self.rng.random::<f32>() - 0.5);
        let vy = match kind {
            EntityKind::Bomb => self
                .rng
                .random_range(tuning.bomb_launch_vy_min..tuning.bomb_launch_vy_max),
            EntityKind::Fruit(_) => self
                .rng
                .random_range(tuning.fruit_launch_vy_min..tuning.fruit_launch_vy_max),
        };
        let rotation_speed = (self.rng.random::<f32>() - 0.5) * 0.08;

        Entity::new(id, kind, pos, Vec2::new(vx, vy), rotation_speed)
    }

    /// Drop spent entities from the population and count the fruit the player
    /// let fall. Sliced fruit and bombs leave without penalty.
    pub fn cleanup(&self, entities: &mut Vec<Entity>) -> u32 {
        let height = self.viewport.height;
        let mut missed = 0;
        entities.retain(|entity| {
            if entity.missed && !entity.kind.is_bomb() {
                missed += 1;
                return false;
            }
            if entity.sliced && entity.fragments_spent(height) {
                return false;
            }
            // A passed bomb costs nothing
            !(entity.kind.is_bomb() && entity.missed)
        });
        missed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GamePhase;

    const VIEW: Viewport = Viewport {
        width: 800.0,
        height: 600.0,
    };

    fn setup(seed: u64) -> (Spawner, GameState, Tuning) {
        let mut state = GameState::new(3);
        state.phase = GamePhase::Playing;
        let tuning = Tuning::default();
        (Spawner::new(seed, VIEW, &tuning), state, tuning)
    }

    /// Force one spawn event by jumping the clock past any possible delay
    fn force_spawn(spawner: &mut Spawner, state: &mut GameState, tuning: &Tuning) {
        state.clock_ms += 3000.0;
        spawner.update(state, 1.0, tuning, true);
    }

    #[test]
    fn initial_delay_rolls_from_the_given_tuning() {
        // Pin every bound to one value so the only possible roll is 42
        let tuning = Tuning {
            spawn_delay_min_ms: 42.0,
            spawn_delay_max_ms: 42.0,
            spawn_delay_min_floor_ms: 42.0,
            spawn_delay_max_floor_ms: 42.0,
            ..Tuning::default()
        };
        let spawner = Spawner::new(1, VIEW, &tuning);
        assert_eq!(spawner.next_delay_ms, 42.0);
    }

    #[test]
    fn first_active_tick_spawns_immediately() {
        let (mut spawner, mut state, tuning) = setup(1);
        spawner.update(&mut state, 1.0, &tuning, true);
        assert!(!state.entities.is_empty());
    }

    #[test]
    fn no_spawning_while_disabled() {
        let (mut spawner, mut state, tuning) = setup(1);
        for _ in 0..300 {
            state.clock_ms += 3000.0;
            spawner.update(&mut state, 1.0, &tuning, false);
        }
        assert!(state.entities.is_empty());
        assert_eq!(spawner.difficulty(), 1.0, "difficulty frozen too");
    }

    #[test]
    fn difficulty_ramps_only_during_active_play() {
        let (mut spawner, mut state, tuning) = setup(1);
        spawner.update(&mut state, 10.0, &tuning, true);
        let ramped = spawner.difficulty();
        assert!((ramped - (1.0 + tuning.difficulty_rate * 10.0)).abs() < 1e-6);
        spawner.update(&mut state, 10.0, &tuning, false);
        assert_eq!(spawner.difficulty(), ramped);
    }

    #[test]
    fn delay_bounds_shrink_to_floors() {
        let (mut spawner, _, tuning) = setup(1);
        let (min0, max0) = spawner.delay_bounds(&tuning);
        assert_eq!((min0, max0), (1180.0, 2460.0));

        spawner.difficulty = 30.0;
        let (min1, max1) = spawner.delay_bounds(&tuning);
        assert!(min1 < min0 && max1 < max0);

        spawner.difficulty = 10_000.0;
        let (min2, max2) = spawner.delay_bounds(&tuning);
        assert_eq!(min2, tuning.spawn_delay_min_floor_ms);
        assert_eq!(max2, tuning.spawn_delay_max_floor_ms);
        assert!(min2 < max2);
    }

    #[test]
    fn launches_start_below_the_bottom_edge_moving_up() {
        let (mut spawner, _, tuning) = setup(99);
        for id in 0..400 {
            let e = spawner.launch(id, &tuning);
            assert!(e.pos.x >= VIEW.width * 0.15 && e.pos.x < VIEW.width * 0.85);
            assert_eq!(e.pos.y, VIEW.height + e.radius);
            assert!(e.vel.y < 0.0, "must launch upward");
            assert!(e.vel.y >= -14.0 && e.vel.y < -9.0);
            assert!(e.vel.x.abs() <= 2.5);
            assert!(!e.sliced && !e.missed);
        }
    }

    #[test]
    fn bomb_and_double_spawn_rates_converge() {
        let (mut spawner, mut state, tuning) = setup(42);
        let mut events = 0u32;
        let mut doubles = 0u32;
        let mut bombs = 0u32;
        let mut total = 0u32;
        for _ in 0..5000 {
            force_spawn(&mut spawner, &mut state, &tuning);
            events += 1;
            let spawned: Vec<Entity> = state.entities.drain(..).collect();
            assert!(spawned.len() == 1 || spawned.len() == 2);
            if spawned.len() == 2 {
                doubles += 1;
            }
            total += spawned.len() as u32;
            bombs += spawned.iter().filter(|e| e.kind.is_bomb()).count() as u32;
        }
        let double_rate = doubles as f64 / events as f64;
        let bomb_rate = bombs as f64 / total as f64;
        assert!(
            (double_rate - tuning.double_spawn_chance as f64).abs() < 0.02,
            "double rate {double_rate}"
        );
        assert!(
            (bomb_rate - tuning.bomb_chance as f64).abs() < 0.02,
            "bomb rate {bomb_rate}"
        );
    }

    #[test]
    fn same_seed_same_launches() {
        let (mut a, mut state_a, tuning) = setup(7);
        let (mut b, mut state_b, _) = setup(7);
        for _ in 0..20 {
            force_spawn(&mut a, &mut state_a, &tuning);
            force_spawn(&mut b, &mut state_b, &tuning);
        }
        assert_eq!(state_a.entities.len(), state_b.entities.len());
        for (ea, eb) in state_a.entities.iter().zip(&state_b.entities) {
            assert_eq!(ea.kind, eb.kind);
            assert_eq!(ea.pos, eb.pos);
            assert_eq!(ea.vel, eb.vel);
        }
    }

    #[test]
    fn cleanup_tallies_missed_fruit_only() {
        let (spawner, mut state, _) = setup(1);
        let mut dropped_fruit = Entity::new(
            1,
            EntityKind::Fruit(FruitKind::Orange),
            Vec2::new(100.0, 800.0),
            Vec2::ZERO,
            0.0,
        );
        dropped_fruit.missed = true;
        let mut passed_bomb = Entity::new(2, EntityKind::Bomb, Vec2::new(200.0, 800.0), Vec2::ZERO, 0.0);
        passed_bomb.missed = true;
        let live_fruit = Entity::new(
            3,
            EntityKind::Fruit(FruitKind::Grape),
            Vec2::new(300.0, 300.0),
            Vec2::ZERO,
            0.0,
        );
        state.entities = vec![dropped_fruit, passed_bomb, live_fruit];

        let missed = spawner.cleanup(&mut state.entities);
        assert_eq!(missed, 1);
        assert_eq!(state.entities.len(), 1);
        assert_eq!(state.entities[0].id, 3);
    }

    #[test]
    fn cleanup_keeps_sliced_fruit_until_fragments_fade() {
        let (mut spawner, mut state, _) = setup(1);
        let mut sliced = Entity::new(
            1,
            EntityKind::Fruit(FruitKind::Mango),
            Vec2::new(100.0, 100.0),
            Vec2::ZERO,
            0.0,
        );
        sliced.slice(spawner.rng_mut());
        state.entities = vec![sliced];

        assert_eq!(spawner.cleanup(&mut state.entities), 0);
        assert_eq!(state.entities.len(), 1, "fresh halves still visible");

        for half in &mut state.entities[0].fragments {
            half.opacity = 0.0;
        }
        assert_eq!(spawner.cleanup(&mut state.entities), 0, "sliced exit is free");
        assert!(state.entities.is_empty());
    }
}
