//! Falling Leaves
//!
//! Short-lived particles that borrow the look of a canopy leaf, drift down
//! with a little noise-driven wobble and fade out.

use crate::display::PixelBuffer;
use crate::math2d::Vec2;
use crate::tree::Leaf;
use crate::util::{alpha, Hsb, Rng};
use std::f32::consts::TAU;

/// Peak alpha (0-100 scale) of a fresh falling leaf
const FALLING_ALPHA: f32 = 35.0;
/// Amplitude of the sideways wobble per frame
const DRIFT_AMPLITUDE: f32 = 0.3;

/// A single falling leaf
#[derive(Debug, Clone)]
pub struct FallingLeaf {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: Hsb,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// 1 when released, removed at or below 0
    pub life: f32,
}

impl FallingLeaf {
    /// Release a new particle from a canopy leaf
    pub fn from_leaf(leaf: &Leaf, rng: &mut Rng) -> Self {
        Self {
            pos: leaf.pos,
            vel: Vec2::new(rng.range_f32(-0.5, 0.5), rng.range_f32(0.3, 1.0)),
            size: rng.range_f32(3.0, 6.0),
            color: leaf.color,
            rotation: rng.range_f32(0.0, TAU),
            rotation_speed: rng.range_f32(-0.03, 0.03),
            life: 1.0,
        }
    }

    /// Check if particle is still alive
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

/// Falling leaf manager
pub struct LeafFall {
    leaves: Vec<FallingLeaf>,
    decay: f32,
}

impl LeafFall {
    pub fn new(decay: f32) -> Self {
        Self {
            leaves: Vec::with_capacity(64),
            decay,
        }
    }

    /// Add a particle
    pub fn emit(&mut self, leaf: FallingLeaf) {
        self.leaves.push(leaf);
    }

    /// With probability `chance`, release a copy of a random canopy leaf
    pub fn maybe_release(&mut self, canopy: &[Leaf], chance: f32, rng: &mut Rng) {
        if rng.chance(chance) {
            if let Some(source) = rng.pick(canopy) {
                let leaf = FallingLeaf::from_leaf(source, rng);
                self.emit(leaf);
            }
        }
    }

    /// Move, spin and age every particle; drop the dead and the fallen.
    ///
    /// `drift` is the scene's slow time axis; `floor` is the surface height.
    pub fn update(&mut self, drift: f32, floor: f32) {
        for p in &mut self.leaves {
            let wobble = (drift * 100.0 + p.rotation).sin() * DRIFT_AMPLITUDE;
            p.pos += Vec2::new(p.vel.x + wobble, p.vel.y);
            p.rotation += p.rotation_speed;
            p.life -= self.decay;
        }

        self.leaves.retain(|p| p.is_alive() && p.pos.y <= floor);
    }

    /// Render as small rotated ovals, fading with remaining life
    pub fn render(&self, buffer: &mut PixelBuffer) {
        for p in &self.leaves {
            let (r, g, b) = p.color.rgb();
            buffer.fill_ellipse_blend(
                p.pos.x,
                p.pos.y,
                p.size * 0.5,
                p.size * 0.75,
                p.rotation,
                r,
                g,
                b,
                alpha(FALLING_ALPHA * p.life),
            );
        }
    }

    pub fn leaves(&self) -> &[FallingLeaf] {
        &self.leaves
    }

    /// Get particle count
    pub fn count(&self) -> usize {
        self.leaves.len()
    }

    /// Clear all particles
    pub fn clear(&mut self) {
        self.leaves.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(life: f32) -> FallingLeaf {
        FallingLeaf {
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::new(0.0, 0.5),
            size: 4.0,
            color: Hsb::new(100.0, 40.0, 50.0),
            rotation: 0.0,
            rotation_speed: 0.01,
            life,
        }
    }

    #[test]
    fn test_expired_particle_removed_exactly() {
        let mut fall = LeafFall::new(0.003);
        fall.emit(particle(1.0));
        fall.emit(particle(0.5));
        fall.emit(particle(0.002));
        fall.update(0.0, 600.0);

        assert_eq!(fall.count(), 2);
        let lives: Vec<f32> = fall.leaves().iter().map(|p| p.life).collect();
        assert!((lives[0] - 0.997).abs() < 1e-6);
        assert!((lives[1] - 0.497).abs() < 1e-6);
    }

    #[test]
    fn test_life_strictly_decreases() {
        let mut fall = LeafFall::new(0.003);
        fall.emit(particle(1.0));
        let mut last = 1.0;
        while fall.count() > 0 {
            fall.update(0.1, 10_000.0);
            if let Some(p) = fall.leaves().first() {
                assert!(p.life < last);
                assert!(p.life > 0.0);
                last = p.life;
            }
        }
    }

    #[test]
    fn test_removed_below_floor() {
        let mut fall = LeafFall::new(0.003);
        let mut p = particle(1.0);
        p.pos.y = 599.8;
        fall.emit(p);
        fall.update(0.0, 600.0);
        assert_eq!(fall.count(), 0);
    }

    #[test]
    fn test_release_copies_leaf_color() {
        let canopy = vec![Leaf {
            pos: Vec2::new(40.0, 60.0),
            size: 8.0,
            color: Hsb::new(120.0, 50.0, 60.0),
            sway_phase: 0.0,
            sway_speed: 1.0,
            grow_at: 0.5,
            angle: 0.0,
        }];
        let mut fall = LeafFall::new(0.003);
        let mut rng = Rng::new(2);
        fall.maybe_release(&canopy, 1.0, &mut rng);
        assert_eq!(fall.count(), 1);
        let p = &fall.leaves()[0];
        assert_eq!(p.color, canopy[0].color);
        assert!(p.pos.approx_eq(&canopy[0].pos, 1e-6));
        assert!(p.vel.y > 0.0);

        // Never from an empty canopy, never at zero chance
        fall.maybe_release(&[], 1.0, &mut rng);
        fall.maybe_release(&canopy, 0.0, &mut rng);
        assert_eq!(fall.count(), 1);
    }
}
