//! Session lifecycle
//!
//! `Session` owns one player-facing run of the game: the simulation state,
//! the spawner, the pointer filter, a scheduler for delayed transitions,
//! and an event bus that fans simulation events out to any number of
//! subscribers (HUD, audio, logging). Shells push detections and frame
//! deltas in; everything else is driven from here.

use std::sync::mpsc::{Receiver, Sender, channel};

use glam::Vec2;
use serde::Serialize;

use crate::Viewport;
use crate::consts;
use crate::settings::Settings;
use crate::sim::state::{Entity, Particle};
use crate::sim::{self, GameEvent, GamePhase, GameState, Spawner, TickFrame};
use crate::tracking::{HandDetection, HandSample, HandSource, PointerFilter};
use crate::tuning::Tuning;

/// Work the scheduler can hand back to the session at a later clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    CountdownTick { seconds_left: u8 },
    CountdownGo,
    FinishCountdown,
    BombGameOver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Scheduled {
    id: u32,
    due_ms: f64,
    task: Task,
}

/// Clock-driven task queue. Everything delayed goes through here so a
/// restart can cancel the lot in one call; a task from a dead round firing
/// into a fresh one is the classic stale-callback bug.
#[derive(Debug, Default)]
struct Scheduler {
    queue: Vec<Scheduled>,
    next_id: u32,
}

impl Scheduler {
    fn schedule(&mut self, now_ms: f64, delay_ms: f64, task: Task) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push(Scheduled {
            id,
            due_ms: now_ms + delay_ms,
            task,
        });
        id
    }

    #[cfg(test)]
    fn cancel(&mut self, id: u32) -> bool {
        let before = self.queue.len();
        self.queue.retain(|s| s.id != id);
        self.queue.len() < before
    }

    fn cancel_all(&mut self) {
        self.queue.clear();
    }

    fn is_pending(&self, task: Task) -> bool {
        self.queue.iter().any(|s| s.task == task)
    }

    /// Remove and return every task due at `now_ms`, earliest first
    fn pop_due(&mut self, now_ms: f64) -> Vec<Task> {
        let mut due: Vec<Scheduled> = Vec::new();
        self.queue.retain(|s| {
            if s.due_ms <= now_ms {
                due.push(*s);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|s| s.task).collect()
    }
}

/// Fan-out of game events to any number of subscribers; dead receivers are
/// pruned on the next broadcast
#[derive(Debug, Default)]
struct EventBus {
    senders: Vec<Sender<GameEvent>>,
}

impl EventBus {
    fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }

    fn broadcast(&mut self, event: GameEvent) {
        self.senders.retain(|s| s.send(event).is_ok());
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.senders.len()
    }

    fn close(&mut self) {
        self.senders.clear();
    }
}

/// Everything a renderer needs for one frame, already filtered through the
/// player's settings
#[derive(Debug, Serialize)]
pub struct FrameView<'a> {
    pub entities: &'a [Entity],
    pub trail: &'a [Vec2],
    pub particles: &'a [Particle],
    pub cursor: Option<Vec2>,
    pub shake: Vec2,
    pub flash: f32,
}

pub struct Session {
    state: GameState,
    spawner: Spawner,
    filter: PointerFilter,
    scheduler: Scheduler,
    bus: EventBus,
    tuning: Tuning,
    settings: Settings,
    viewport: Viewport,
    latest_sample: Option<HandSample>,
}

impl Session {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, Tuning::default(), Settings::load())
    }

    pub fn with_config(seed: u64, tuning: Tuning, settings: Settings) -> Self {
        let viewport = Viewport::default();
        Self {
            state: GameState::new(tuning.max_lives),
            spawner: Spawner::new(seed, viewport, &tuning),
            filter: PointerFilter::new(tuning.slash_velocity_threshold, settings.mirror_input),
            scheduler: Scheduler::default(),
            bus: EventBus::default(),
            tuning,
            settings,
            viewport,
            latest_sample: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swap in new settings; the pointer filter follows the mirror toggle
    pub fn apply_settings(&mut self, settings: Settings) {
        self.filter.set_mirror(settings.mirror_input);
        self.settings = settings;
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.spawner.set_viewport(viewport);
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.bus.subscribe()
    }

    /// Smoothed cursor in pixels, if a hand is tracked
    pub fn cursor(&self) -> Option<Vec2> {
        self.latest_sample
            .map(|s| self.viewport.to_pixels(s.pos))
    }

    pub fn begin_loading(&mut self) {
        self.state.phase = GamePhase::Loading;
        log::info!("loading hand tracker");
    }

    /// Loading failed before a round ever started; fall back to the menu
    pub fn abort_loading(&mut self, reason: &str) {
        log::error!("loading aborted: {reason}");
        self.state.phase = GamePhase::Menu;
    }

    /// Start the pre-round countdown: one tick broadcast per second, a go
    /// banner, then the hand-off into play
    pub fn begin_countdown(&mut self) {
        self.scheduler.cancel_all();
        self.state.phase = GamePhase::Countdown;
        self.set_preview(true);

        let now = self.state.clock_ms;
        let seconds = self.tuning.countdown_seconds;
        self.bus.broadcast(GameEvent::CountdownTick {
            seconds_left: seconds,
        });
        for k in 1..seconds {
            self.scheduler.schedule(
                now,
                k as f64 * 1000.0,
                Task::CountdownTick {
                    seconds_left: seconds - k,
                },
            );
        }
        let go_at = seconds as f64 * 1000.0;
        self.scheduler.schedule(now, go_at, Task::CountdownGo);
        self.scheduler
            .schedule(now, go_at + self.tuning.countdown_go_ms, Task::FinishCountdown);
        log::info!("countdown started, {seconds}s");
    }

    /// Begin a fresh round on the existing clock. Usually reached through
    /// the countdown hand-off, but a shell may skip straight in.
    pub fn start(&mut self) {
        self.scheduler.cancel_all();
        self.state.reset_round(self.tuning.max_lives);
        self.state.phase = GamePhase::Playing;
        self.state.preview = false;
        self.spawner.reset(&self.tuning);
        self.bus.broadcast(GameEvent::ScoreChanged { score: 0 });
        self.bus.broadcast(GameEvent::LivesChanged {
            lives: self.tuning.max_lives,
        });
        self.bus.broadcast(GameEvent::ComboChanged { combo: 0 });
        log::info!("round started");
    }

    /// Throw the whole run away and start a new one immediately
    pub fn restart(&mut self, seed: u64) {
        self.scheduler.cancel_all();
        self.state = GameState::new(self.tuning.max_lives);
        self.spawner = Spawner::new(seed, self.viewport, &self.tuning);
        self.filter.reset();
        self.latest_sample = None;
        self.state.phase = GamePhase::Playing;
        self.bus.broadcast(GameEvent::ScoreChanged { score: 0 });
        self.bus.broadcast(GameEvent::LivesChanged {
            lives: self.tuning.max_lives,
        });
        self.bus.broadcast(GameEvent::ComboChanged { combo: 0 });
        log::info!("restarted, seed {seed}");
    }

    pub fn set_preview(&mut self, preview: bool) {
        if self.state.preview != preview {
            log::debug!("preview {}", if preview { "on" } else { "off" });
        }
        self.state.preview = preview;
    }

    /// Feed one batch of raw detections; `None`-like empty batches release
    /// the trail and clear the cursor
    pub fn feed_detections(&mut self, detections: &[HandDetection], timestamp_ms: f64) {
        match self.filter.process(detections, timestamp_ms) {
            Some(sample) => {
                let px = self.viewport.to_pixels(sample.pos);
                self.state.trail.add_point(px, sample.slashing);
                self.latest_sample = Some(sample);
            }
            None => {
                self.state.trail.release();
                self.latest_sample = None;
            }
        }
    }

    /// Pull one frame of detections from a source. A detector fault counts
    /// as an empty frame; the game plays on without a cursor.
    pub fn poll_source(&mut self, source: &mut dyn HandSource, timestamp_ms: f64) {
        match source.detect(timestamp_ms) {
            Ok(detections) => self.feed_detections(&detections, timestamp_ms),
            Err(err) => {
                log::debug!("detector skipped a frame: {err}");
                self.feed_detections(&[], timestamp_ms);
            }
        }
    }

    /// Advance one frame; `delta` is in 60 Hz frame units
    pub fn update(&mut self, delta: f32) {
        let delta = delta.clamp(0.0, consts::MAX_DELTA_FRAMES);
        let frame = TickFrame {
            delta,
            hand: self.latest_sample,
            viewport: self.viewport,
        };
        sim::tick(&mut self.state, &mut self.spawner, &frame, &self.tuning);
        self.dispatch_events();

        for task in self.scheduler.pop_due(self.state.clock_ms) {
            match task {
                Task::CountdownTick { seconds_left } => {
                    self.bus.broadcast(GameEvent::CountdownTick { seconds_left });
                }
                Task::CountdownGo => self.bus.broadcast(GameEvent::CountdownGo),
                Task::FinishCountdown => {
                    self.set_preview(false);
                    self.start();
                }
                Task::BombGameOver => {
                    sim::trigger_game_over(&mut self.state);
                }
            }
        }
        self.dispatch_events();
    }

    /// Drain simulation events onto the bus; a bomb contact also lights the
    /// delayed game-over fuse, once
    fn dispatch_events(&mut self) {
        if self.state.events.is_empty() {
            return;
        }
        let events: Vec<GameEvent> = self.state.events.drain(..).collect();
        for event in events {
            if event == GameEvent::BombContact
                && self.state.phase == GamePhase::Playing
                && !self.scheduler.is_pending(Task::BombGameOver)
            {
                self.scheduler.schedule(
                    self.state.clock_ms,
                    self.tuning.bomb_game_over_delay_ms,
                    Task::BombGameOver,
                );
                log::info!("bomb fuse lit");
            }
            self.bus.broadcast(event);
        }
    }

    /// Unrecoverable shell fault (camera died, tracker crashed): end the
    /// run cleanly instead of freezing mid-round
    pub fn fail_stop(&mut self, reason: &str) {
        log::error!("session failed: {reason}");
        self.scheduler.cancel_all();
        sim::trigger_game_over(&mut self.state);
        self.dispatch_events();
    }

    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        self.bus.close();
        log::info!("session closed");
    }

    /// Render snapshot with the player's settings already applied
    pub fn frame_view(&self) -> FrameView<'_> {
        FrameView {
            entities: &self.state.entities,
            trail: if self.settings.trails {
                &self.state.trail.points
            } else {
                &[]
            },
            particles: if self.settings.particles {
                &self.state.particles
            } else {
                &[]
            },
            cursor: self.cursor(),
            shake: if self.settings.effective_screen_shake() {
                self.state.effects.shake_offset
            } else {
                Vec2::ZERO
            },
            flash: if self.settings.effective_flash() {
                self.state.effects.flash
            } else {
                0.0
            },
        }
    }
}
