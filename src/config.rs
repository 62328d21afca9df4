//! Tuning parameters, loadable from a JSON file
//!
//! Every section uses `#[serde(default)]`, so a file only needs to name the
//! values it wants to change.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Growth progress added every frame
    pub rate_per_frame: f32,
    /// Progress span over which a segment extends from start to end
    pub segment_reveal: f32,
    /// Progress span over which a leaf fades in
    pub leaf_reveal: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            rate_per_frame: 0.001,
            segment_reveal: 0.05,
            leaf_reveal: 0.06,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoliageConfig {
    /// Standalone leaves scattered over the canopy ellipse
    pub canopy_leaves: usize,
}

impl Default for FoliageConfig {
    fn default() -> Self {
        Self { canopy_leaves: 250 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallingLeafConfig {
    /// Per-frame probability of a leaf letting go once fully grown
    pub spawn_chance: f32,
    /// Life lost per frame
    pub decay: f32,
}

impl Default for FallingLeafConfig {
    fn default() -> Self {
        Self {
            spawn_chance: 0.008,
            decay: 0.003,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdConfig {
    /// Population cap
    pub max_birds: usize,
    /// Birds arriving in the first wave after full growth
    pub initial_burst: usize,
    /// Seconds between arrivals in the first wave
    pub burst_stagger: f32,
    /// Extra random delay added to each first-wave arrival (seconds)
    pub burst_jitter: f32,
    /// Seconds between recurring spawn checks
    pub spawn_interval: f32,
    /// Probability that a recurring check spawns a bird
    pub spawn_chance: f32,
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            max_birds: 10,
            initial_burst: 6,
            burst_stagger: 2.0,
            burst_jitter: 1.5,
            spawn_interval: 8.0,
            spawn_chance: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongConfig {
    pub enabled: bool,
    /// Seconds after full growth before the audio device is opened
    pub start_delay: f32,
    /// Shortest pause between calls (seconds)
    pub min_gap: f32,
    /// Longest pause between calls (seconds)
    pub max_gap: f32,
    /// Master gain applied to every note
    pub volume: f32,
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_delay: 3.0,
            min_gap: 2.0,
            max_gap: 6.0,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Leaves closer than this (pixels) are pushed away from the pointer
    pub radius: f32,
    /// Displacement at zero distance (pixels)
    pub max_push: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            radius: 150.0,
            max_push: 6.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub growth: GrowthConfig,
    pub foliage: FoliageConfig,
    pub falling_leaves: FallingLeafConfig,
    pub birds: BirdConfig,
    pub song: SongConfig,
    pub pointer: PointerConfig,
    /// Replay the growth animation after a resize instead of showing the
    /// regenerated tree at its current progress
    pub regrow_on_resize: bool,
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reject values that would stall growth or break event timing
    pub fn validate(&self) -> Result<(), Error> {
        fn positive(name: &str, v: f32) -> Result<(), Error> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(Error::Config(format!("{name} must be positive, got {v}")))
            }
        }
        fn probability(name: &str, v: f32) -> Result<(), Error> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(Error::Config(format!("{name} must be within [0, 1], got {v}")))
            }
        }

        positive("growth.rate_per_frame", self.growth.rate_per_frame)?;
        positive("growth.segment_reveal", self.growth.segment_reveal)?;
        positive("growth.leaf_reveal", self.growth.leaf_reveal)?;
        if self.growth.segment_reveal.max(self.growth.leaf_reveal) >= 1.0 {
            return Err(Error::Config("reveal windows must be shorter than 1".into()));
        }
        positive("falling_leaves.decay", self.falling_leaves.decay)?;
        probability("falling_leaves.spawn_chance", self.falling_leaves.spawn_chance)?;
        positive("birds.spawn_interval", self.birds.spawn_interval)?;
        probability("birds.spawn_chance", self.birds.spawn_chance)?;
        positive("pointer.radius", self.pointer.radius)?;
        positive("song.max_gap", self.song.max_gap)?;
        if self.song.min_gap < 0.0 || self.song.min_gap > self.song.max_gap {
            return Err(Error::Config("song.min_gap must be within [0, max_gap]".into()));
        }
        Ok(())
    }
}
