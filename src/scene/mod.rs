//! Scene — the whole animation as one owned value
//!
//! Owns the generated tree, growth progress, falling leaves, birds, the
//! birdsong voice and a queue of timed events. Everything advances from
//! [`Scene::tick`] against the scene's own clock; drawing lives in
//! `render.rs` and never mutates state.

mod events;
mod render;

pub use events::{EventQueue, SceneEvent};

use crate::audio::song::{self, Call};
use crate::audio::{Birdsong, Opener};
use crate::birds::Flock;
use crate::config::Config;
use crate::growth::Growth;
use crate::math2d::Vec2;
use crate::noise::Noise;
use crate::particles::LeafFall;
use crate::tree::{self, Leaf, Structure};
use crate::util::Rng;

/// Slow animation axis advanced every step (sway, wobble, pulses)
const DRIFT_PER_FRAME: f32 = 0.003;
/// Length of one simulation step in seconds
const STEP: f64 = 1.0 / 60.0;
/// Steps run by a single tick before the remaining lag is dropped
const MAX_STEPS_PER_TICK: u32 = 8;
const LEAF_SWAY_X: f32 = 2.5;
const LEAF_SWAY_Y: f32 = 1.2;

#[derive(Debug, Clone, Copy, Default)]
pub struct Pointer {
    pub pos: Vec2,
    /// Set by the first pointer move, never cleared
    pub active: bool,
}

pub struct Scene {
    config: Config,
    width: u32,
    height: u32,
    structure: Structure,
    growth: Growth,
    leaf_fall: LeafFall,
    flock: Flock,
    pointer: Pointer,
    events: EventQueue,
    birdsong: Birdsong,
    rng: Rng,
    noise: Noise,
    /// Seconds since creation
    clock: f64,
    /// Host time not yet consumed by a step
    lag: f64,
    frame: u64,
    drift: f32,
    /// Set on the first tick at full growth; cleared by regeneration
    bloomed: bool,
    song_started: bool,
    /// Bumped every time the structure is regenerated
    epoch: u64,
    disposed: bool,
}

impl Scene {
    pub fn new(width: u32, height: u32, config: Config, seed: u64, opener: Option<Opener>) -> Self {
        let opener = if config.song.enabled { opener } else { None };
        let birdsong = Birdsong::new(opener, config.song.volume);

        let mut scene = Self {
            width,
            height,
            structure: Structure::empty(width as f32, height as f32),
            growth: Growth::new(config.growth.rate_per_frame),
            leaf_fall: LeafFall::new(config.falling_leaves.decay),
            flock: Flock::new(config.birds.max_birds),
            pointer: Pointer::default(),
            events: EventQueue::new(),
            birdsong,
            rng: Rng::new(seed),
            noise: Noise::new(seed as u32),
            clock: 0.0,
            lag: 0.0,
            frame: 0,
            drift: 0.0,
            bloomed: false,
            song_started: false,
            epoch: 0,
            disposed: false,
            config,
        };
        scene.regenerate();
        scene
    }

    /// Advance the simulation by `dt` seconds of host time.
    ///
    /// Time is consumed in fixed steps of 1/60 s, so growth, motion and
    /// event timing follow wall time regardless of the frame rate. A slow
    /// frame runs at most [`MAX_STEPS_PER_TICK`] steps.
    pub fn tick(&mut self, dt: f64) {
        if self.disposed {
            return;
        }
        self.lag += dt.max(0.0);
        let mut steps = 0;
        while self.lag + 1e-9 >= STEP {
            if steps == MAX_STEPS_PER_TICK {
                log::debug!("dropping {:.3}s of simulation lag", self.lag);
                self.lag = 0.0;
                break;
            }
            self.lag -= STEP;
            self.step();
            steps += 1;
        }
    }

    fn step(&mut self) {
        self.clock += STEP;
        self.frame += 1;
        self.drift += DRIFT_PER_FRAME;

        self.growth.advance();
        if self.growth.is_complete() && !self.bloomed {
            self.bloom();
        }

        while let Some(event) = self.events.pop_due(self.clock) {
            self.handle(event);
        }

        if self.growth.is_complete() {
            self.leaf_fall.maybe_release(
                &self.structure.leaves,
                self.config.falling_leaves.spawn_chance,
                &mut self.rng,
            );
        }
        self.leaf_fall.update(self.drift, self.height as f32);
        self.flock.update(self.frame, &mut self.rng);
    }

    /// Regenerate for a new surface size. Zero-sized surfaces are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.disposed {
            return;
        }
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {width}x{height}");
            return;
        }
        self.width = width;
        self.height = height;
        self.regenerate();
        if self.config.regrow_on_resize {
            self.growth.reset();
        }
    }

    /// Grow a brand new tree from bare ground at the current size
    pub fn replant(&mut self) {
        if self.disposed {
            return;
        }
        self.regenerate();
        self.growth.reset();
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.pointer = Pointer {
            pos: Vec2::new(x, y),
            active: true,
        };
    }

    /// Cancel pending events and release the audio output. Further ticks
    /// are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.events.clear();
        self.birdsong.dispose();
        self.flock.clear();
        self.leaf_fall.clear();
        log::info!("scene disposed after {} frames", self.frame);
    }

    /// New structure, empty sky, and a re-armed bloom
    fn regenerate(&mut self) {
        let params = tree::Params {
            width: self.width as f32,
            height: self.height as f32,
            canopy_leaves: self.config.foliage.canopy_leaves,
            reveal_tail: self
                .config
                .growth
                .segment_reveal
                .max(self.config.growth.leaf_reveal),
        };
        self.structure = tree::generate(&params, &mut self.rng, &self.noise);
        self.epoch += 1;

        self.flock.clear();
        self.leaf_fall.clear();
        self.events.retain(|e| !e.is_bird_event());
        self.bloomed = false;

        log::info!(
            "planted tree #{} at {}x{}: {} segments, {} leaves",
            self.epoch,
            self.width,
            self.height,
            self.structure.segments.len(),
            self.structure.leaves.len()
        );
    }

    /// First tick at full growth: schedule the arrival burst, the song and
    /// the recurring spawn check
    fn bloom(&mut self) {
        self.bloomed = true;
        let birds = &self.config.birds;
        log::info!("tree fully grown, {} birds on the way", birds.initial_burst);

        for i in 0..birds.initial_burst {
            let delay = i as f32 * birds.burst_stagger + self.rng.range_f32(0.0, birds.burst_jitter);
            self.events
                .schedule(self.clock + f64::from(delay), SceneEvent::SpawnBird);
        }
        self.events.schedule(
            self.clock + f64::from(birds.spawn_interval),
            SceneEvent::SpawnCheck,
        );

        if self.config.song.enabled
            && !self.song_started
            && self.events.count(SceneEvent::StartSong) == 0
        {
            self.events.schedule(
                self.clock + f64::from(self.config.song.start_delay),
                SceneEvent::StartSong,
            );
        }
    }

    fn handle(&mut self, event: SceneEvent) {
        match event {
            SceneEvent::SpawnBird => {
                self.flock.spawn(&self.structure, &mut self.rng);
            },
            SceneEvent::SpawnCheck => {
                if self.flock.has_room() && self.rng.chance(self.config.birds.spawn_chance) {
                    self.flock.spawn(&self.structure, &mut self.rng);
                }
                self.events.schedule(
                    self.clock + f64::from(self.config.birds.spawn_interval),
                    SceneEvent::SpawnCheck,
                );
            },
            SceneEvent::StartSong => {
                if self.song_started {
                    return;
                }
                self.song_started = true;
                self.birdsong.start();
                if self.birdsong.is_active() {
                    self.schedule_song();
                }
            },
            SceneEvent::Song => {
                let call = Call::pick(&mut self.rng);
                let notes = call.notes(&mut self.rng);
                self.birdsong.perform(&notes);
                if let Call::Chirp { echo: Some(delay) } = call {
                    self.events
                        .schedule(self.clock + f64::from(delay), SceneEvent::Chirp);
                }
                self.schedule_song();
            },
            SceneEvent::Chirp => {
                let notes = song::chirp(&mut self.rng);
                self.birdsong.perform(&notes);
            },
        }
    }

    fn schedule_song(&mut self) {
        let gap = self
            .rng
            .range_f32(self.config.song.min_gap, self.config.song.max_gap);
        self.events
            .schedule(self.clock + f64::from(gap), SceneEvent::Song);
    }

    /// Drawn displacement of a leaf: ambient sway plus pointer repulsion,
    /// both only once the tree is fully grown
    pub fn leaf_offset(&self, leaf: &Leaf) -> Vec2 {
        if !self.growth.is_complete() {
            return Vec2::zero();
        }
        let mut offset = leaf_sway(leaf, self.drift);
        if self.pointer.active {
            offset += pointer_push(
                leaf.pos,
                self.pointer.pos,
                self.config.pointer.radius,
                self.config.pointer.max_push,
            );
        }
        offset
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn progress(&self) -> f32 {
        self.growth.progress()
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn falling_leaves(&self) -> &LeafFall {
        &self.leaf_fall
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_bloomed(&self) -> bool {
        self.bloomed
    }

    pub fn is_singing(&self) -> bool {
        self.birdsong.is_active()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Ambient sway of a fully grown leaf
pub fn leaf_sway(leaf: &Leaf, drift: f32) -> Vec2 {
    let phase = leaf.sway_phase;
    Vec2::new(
        (drift * 50.0 * leaf.sway_speed + phase).sin() * LEAF_SWAY_X,
        (drift * 35.0 * leaf.sway_speed + phase).cos() * LEAF_SWAY_Y,
    )
}

/// Push a leaf directly away from the pointer, scaling linearly from
/// `max_push` at the pointer to nothing at `radius`
pub fn pointer_push(leaf: Vec2, pointer: Vec2, radius: f32, max_push: f32) -> Vec2 {
    let toward = pointer - leaf;
    let dist = toward.length();
    if dist >= radius || dist <= f32::EPSILON {
        return Vec2::zero();
    }
    let push = (1.0 - dist / radius) * max_push;
    toward * (-push / dist)
}
