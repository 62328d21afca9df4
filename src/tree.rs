//! Tree geometry: roots, trunk, canopy and foliage
//!
//! Builds the static geometry of one tree for a given surface size. The
//! result is plain data: nothing here draws or keeps state between calls, so
//! every resize simply produces a brand new [`Structure`].
//!
//! Recursion depth drives both shape and timing. Each level of roots or
//! branches gets a later growth threshold than its parent, so a single
//! progress scalar reveals the tree from the seed outward.

use crate::math2d::Vec2;
use crate::noise::Noise;
use crate::util::{lerp, Hsb, Rng};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Ground line as a fraction of surface height
pub const GROUND_LINE: f32 = 0.72;

const ROOT_MAX_DEPTH: u32 = 8;
const ROOT_MIN_LENGTH: f32 = 3.0;
const ROOT_DIRECTIONS: [f32; 7] = [0.35, 0.45, 0.55, 0.5, 0.65, 0.75, 0.85];
const ROOT_BASE_GROW: f32 = 0.06;

const TRUNK_SEGMENTS: usize = 14;
const TRUNK_HEIGHT: f32 = 0.38;

const BRANCH_MAX_DEPTH: u32 = 8;
const BRANCH_MIN_LENGTH: f32 = 5.0;
const BRANCH_DIRECTIONS: [f32; 9] = [-1.3, -1.0, -0.6, -0.25, 0.0, 0.25, 0.6, 1.0, 1.3];
const BRANCH_BASE_GROW: f32 = 0.32;
/// Branches at or beyond this depth carry leaves
const LEAF_MIN_DEPTH: u32 = 2;
/// Leaves trail their segment by this much growth progress
const LEAF_LAG: f32 = 0.06;

/// Keep scattered canopy leaves this far above the ground line
const CANOPY_GROUND_CLEARANCE: f32 = 30.0;

/// One straight piece of root, trunk or branch
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    pub thickness: f32,
    /// Growth progress at which this segment starts to extend
    pub grow_at: f32,
    pub color: Hsb,
    pub is_root: bool,
    pub depth: u32,
    /// Index of the segment this one sprouted from
    pub parent: Option<usize>,
}

/// A static foliage point
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub pos: Vec2,
    pub size: f32,
    pub color: Hsb,
    pub sway_phase: f32,
    pub sway_speed: f32,
    pub grow_at: f32,
    pub angle: f32,
}

/// Frozen output of one generation pass
#[derive(Debug, Clone)]
pub struct Structure {
    pub segments: Vec<Segment>,
    pub leaves: Vec<Leaf>,
    /// Where the trunk meets the ground
    pub seed: Vec2,
    pub ground_y: f32,
    pub trunk_top: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Structure {
    /// A structure with no geometry, used for zero-sized surfaces
    pub fn empty(width: f32, height: f32) -> Self {
        let seed = Vec2::new(width * 0.5, height * GROUND_LINE);
        Self {
            segments: Vec::new(),
            leaves: Vec::new(),
            seed,
            ground_y: seed.y,
            trunk_top: seed,
            width,
            height,
        }
    }

    /// Latest growth threshold of any element
    pub fn last_threshold(&self) -> f32 {
        self.segments
            .iter()
            .map(|s| s.grow_at)
            .chain(self.leaves.iter().map(|l| l.grow_at))
            .fold(0.0, f32::max)
    }
}

/// Inputs to [`generate`]
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub width: f32,
    pub height: f32,
    /// Standalone leaves scattered over the canopy
    pub canopy_leaves: usize,
    /// Longest reveal window; every element must finish revealing by 1.0
    pub reveal_tail: f32,
}

/// Generate a complete tree for the given surface.
pub fn generate(params: &Params, rng: &mut Rng, noise: &Noise) -> Structure {
    let (w, h) = (params.width, params.height);
    if !(w >= 1.0 && h >= 1.0) {
        return Structure::empty(w.max(0.0), h.max(0.0));
    }

    let mut grower = Grower {
        rng,
        noise,
        segments: Vec::new(),
        leaves: Vec::new(),
    };

    let seed = Vec2::new(w * 0.5, h * GROUND_LINE);

    for dir in ROOT_DIRECTIONS {
        grower.root(Sprout {
            from: seed,
            angle: PI * dir,
            length: h * 0.12,
            thickness: w * 0.009,
            depth: 0,
            base_grow: ROOT_BASE_GROW,
            parent: None,
        });
    }

    let (trunk_top, crown) = grower.trunk(seed, w, h);

    for offset in BRANCH_DIRECTIONS {
        let length = h * grower.rng.range_f32(0.14, 0.26);
        let thickness = w * grower.rng.range_f32(0.005, 0.008);
        grower.branch(Sprout {
            from: trunk_top,
            angle: -FRAC_PI_2 + offset,
            length,
            thickness,
            depth: 0,
            base_grow: BRANCH_BASE_GROW,
            parent: Some(crown),
        });
    }

    grower.scatter_canopy(trunk_top, seed.y, w, h, params.canopy_leaves);

    let mut structure = Structure {
        segments: grower.segments,
        leaves: grower.leaves,
        seed,
        ground_y: seed.y,
        trunk_top,
        width: w,
        height: h,
    };
    normalize_timeline(&mut structure, params.reveal_tail);

    log::debug!(
        "generated {} segments, {} leaves for {}x{}",
        structure.segments.len(),
        structure.leaves.len(),
        w,
        h
    );
    structure
}

/// Rescale thresholds so the latest element still completes its reveal by
/// progress 1. Scaling by a positive factor keeps parent/child order strict.
fn normalize_timeline(structure: &mut Structure, reveal_tail: f32) {
    let ceiling = (1.0 - reveal_tail).clamp(0.0, 1.0);
    let latest = structure.last_threshold();
    let scale = if latest > ceiling && latest > 0.0 {
        ceiling / latest
    } else {
        1.0
    };
    for seg in &mut structure.segments {
        seg.grow_at = (seg.grow_at * scale).clamp(0.0, 1.0);
    }
    for leaf in &mut structure.leaves {
        leaf.grow_at = (leaf.grow_at * scale).clamp(0.0, 1.0);
    }
}

/// A pending recursive step
struct Sprout {
    from: Vec2,
    angle: f32,
    length: f32,
    thickness: f32,
    depth: u32,
    base_grow: f32,
    parent: Option<usize>,
}

struct Grower<'a> {
    rng: &'a mut Rng,
    noise: &'a Noise,
    segments: Vec<Segment>,
    leaves: Vec<Leaf>,
}

impl Grower<'_> {
    fn push(&mut self, segment: Segment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }

    fn root(&mut self, s: Sprout) {
        // NaN lengths fail the comparison and stop here too
        if s.depth > ROOT_MAX_DEPTH || !(s.length >= ROOT_MIN_LENGTH) {
            return;
        }
        let bend = self
            .noise
            .jitter(s.from.x * 0.01, s.from.y * 0.01, s.depth as f32, 0.5);
        let end = s.from + Vec2::from_angle(s.angle + bend) * s.length;
        let grow = s.base_grow + s.depth as f32 * 0.012;
        let t = s.depth as f32 / ROOT_MAX_DEPTH as f32;

        let idx = self.push(Segment {
            start: s.from,
            end,
            thickness: s.thickness,
            grow_at: grow,
            color: Hsb::new(lerp(25.0, 15.0, t), lerp(50.0, 30.0, t), lerp(30.0, 14.0, t)),
            is_root: true,
            depth: s.depth,
            parent: s.parent,
        });

        let children = if s.depth < 3 {
            self.rng.range_usize(2, 5)
        } else {
            self.rng.range_usize(1, 3)
        };
        for _ in 0..children {
            let angle = s.angle + self.rng.range_f32(-0.7, 0.7);
            let length = s.length * self.rng.range_f32(0.55, 0.85);
            let thickness = s.thickness * self.rng.range_f32(0.45, 0.7);
            self.root(Sprout {
                from: end,
                angle,
                length,
                thickness,
                depth: s.depth + 1,
                base_grow: grow + 0.015,
                parent: Some(idx),
            });
        }
    }

    /// Returns the trunk top and the index of its last segment
    fn trunk(&mut self, seed: Vec2, w: f32, h: f32) -> (Vec2, usize) {
        let seg_len = h * TRUNK_HEIGHT / TRUNK_SEGMENTS as f32;
        let mut at = seed;
        let mut parent = None;
        let mut last = 0;

        for i in 0..TRUNK_SEGMENTS {
            let t = i as f32 / TRUNK_SEGMENTS as f32;
            let wobble = self.noise.jitter(i as f32 * 0.5, 42.0, 0.0, 3.0);
            let next = Vec2::new(at.x + wobble, at.y - seg_len);

            last = self.push(Segment {
                start: at,
                end: next,
                thickness: lerp(w * 0.014, w * 0.005, t),
                grow_at: 0.12 + t * 0.2,
                color: Hsb::new(lerp(28.0, 85.0, t), lerp(50.0, 35.0, t), lerp(32.0, 38.0, t)),
                is_root: false,
                depth: 0,
                parent,
            });
            parent = Some(last);
            at = next;
        }
        (at, last)
    }

    fn branch(&mut self, s: Sprout) {
        if s.depth > BRANCH_MAX_DEPTH || !(s.length >= BRANCH_MIN_LENGTH) {
            return;
        }
        let bend = self.noise.jitter(
            s.from.x * 0.008,
            s.from.y * 0.008,
            s.depth as f32 * 0.5,
            0.5,
        );
        let end = s.from + Vec2::from_angle(s.angle + bend) * s.length;
        let grow = s.base_grow + s.depth as f32 * 0.018;
        let t = s.depth as f32 / BRANCH_MAX_DEPTH as f32;

        let idx = self.push(Segment {
            start: s.from,
            end,
            thickness: s.thickness,
            grow_at: grow,
            color: Hsb::new(lerp(85.0, 115.0, t), lerp(32.0, 22.0, t), lerp(38.0, 48.0, t)),
            is_root: false,
            depth: s.depth,
            parent: s.parent,
        });

        if s.depth >= LEAF_MIN_DEPTH {
            self.leaves_along(s.from, end, s.depth, grow + LEAF_LAG);
        }

        let children = match s.depth {
            0 | 1 => self.rng.range_usize(3, 5),
            2 | 3 => self.rng.range_usize(2, 4),
            _ => self.rng.range_usize(1, 3),
        };
        let spread = if s.depth < 2 { 0.9 } else { 0.6 };
        for _ in 0..children {
            let angle = s.angle + self.rng.range_f32(-spread, spread);
            let length = s.length * self.rng.range_f32(0.55, 0.82);
            let thickness = s.thickness * self.rng.range_f32(0.45, 0.75);
            self.branch(Sprout {
                from: end,
                angle,
                length,
                thickness,
                depth: s.depth + 1,
                base_grow: grow + 0.012,
                parent: Some(idx),
            });
        }
    }

    /// Outer branches get denser foliage
    fn leaves_along(&mut self, from: Vec2, to: Vec2, depth: u32, grow_at: f32) {
        let count = if depth >= 5 {
            self.rng.range_usize(4, 8)
        } else {
            self.rng.range_usize(2, 4)
        };
        for _ in 0..count {
            let along = from.lerp(to, self.rng.range_f32(0.3, 1.0));
            let pos = along
                + Vec2::new(
                    self.rng.range_f32(-10.0, 10.0),
                    self.rng.range_f32(-10.0, 10.0),
                );
            let leaf = Leaf {
                pos,
                size: self.rng.range_f32(4.0, 14.0),
                color: Hsb::new(
                    self.rng.range_f32(70.0, 150.0),
                    self.rng.range_f32(30.0, 65.0),
                    self.rng.range_f32(30.0, 70.0),
                ),
                sway_phase: self.rng.range_f32(0.0, 1000.0),
                sway_speed: self.rng.range_f32(0.5, 2.0),
                grow_at,
                angle: self.rng.range_f32(0.0, TAU),
            };
            self.leaves.push(leaf);
        }
    }

    /// Fill the canopy silhouette with loose leaves over a flattened
    /// half-ellipse above the trunk top
    fn scatter_canopy(&mut self, top: Vec2, ground_y: f32, w: f32, h: f32, count: usize) {
        for _ in 0..count {
            let angle = self.rng.range_f32(-PI, 0.0);
            let dist = self.rng.range_f32(w * 0.03, w * 0.52);
            let lift = self.rng.range_f32(0.0, h * 0.1);
            let pos = Vec2::new(
                top.x + angle.cos() * dist,
                top.y + (angle * 0.55).sin() * dist * 0.45 - lift,
            );
            if pos.y > ground_y - CANOPY_GROUND_CLEARANCE {
                continue;
            }
            let leaf = Leaf {
                pos,
                size: self.rng.range_f32(5.0, 16.0),
                color: Hsb::new(
                    self.rng.range_f32(70.0, 150.0),
                    self.rng.range_f32(28.0, 60.0),
                    self.rng.range_f32(30.0, 65.0),
                ),
                sway_phase: self.rng.range_f32(0.0, 1000.0),
                sway_speed: self.rng.range_f32(0.4, 1.5),
                grow_at: self.rng.range_f32(0.5, 0.85),
                angle: self.rng.range_f32(0.0, TAU),
            };
            self.leaves.push(leaf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: f32, height: f32) -> Params {
        Params {
            width,
            height,
            canopy_leaves: 250,
            reveal_tail: 0.06,
        }
    }

    fn tree(seed: u64) -> Structure {
        let mut rng = Rng::new(seed);
        generate(&params(800.0, 600.0), &mut rng, &Noise::new(seed as u32))
    }

    #[test]
    fn test_thresholds_in_unit_range() {
        let t = tree(11);
        assert!(!t.segments.is_empty());
        assert!(!t.leaves.is_empty());
        for seg in &t.segments {
            assert!((0.0..=1.0).contains(&seg.grow_at));
        }
        for leaf in &t.leaves {
            assert!((0.0..=1.0).contains(&leaf.grow_at));
        }
    }

    #[test]
    fn test_children_grow_after_parents() {
        for seed in [1, 2, 3] {
            let t = tree(seed);
            for seg in &t.segments {
                if let Some(p) = seg.parent {
                    let parent = &t.segments[p];
                    assert!(
                        seg.grow_at > parent.grow_at,
                        "child {} !> parent {}",
                        seg.grow_at,
                        parent.grow_at
                    );
                }
            }
        }
    }

    #[test]
    fn test_everything_finishes_revealing() {
        let t = tree(5);
        assert!(t.last_threshold() + 0.06 <= 1.0 + 1e-6);
    }

    #[test]
    fn test_trunk_rises_from_seed() {
        let t = tree(8);
        // Roots come first, the trunk chain follows
        let first = t.segments.iter().position(|s| !s.is_root).unwrap();
        let trunk = &t.segments[first..first + TRUNK_SEGMENTS];
        assert!(trunk[0].start.approx_eq(&t.seed, 1e-4));
        assert!(trunk[TRUNK_SEGMENTS - 1].end.approx_eq(&t.trunk_top, 1e-4));
        for pair in trunk.windows(2) {
            assert!(pair[1].grow_at > pair[0].grow_at);
            assert!(pair[1].thickness < pair[0].thickness);
            assert!(pair[1].start.approx_eq(&pair[0].end, 1e-4));
        }
        assert!((t.seed.y - t.trunk_top.y - 600.0 * TRUNK_HEIGHT).abs() < 1.0);
    }

    #[test]
    fn test_roots_are_roots() {
        let t = tree(21);
        let roots: Vec<&Segment> = t.segments.iter().filter(|s| s.is_root).collect();
        assert!(roots.len() >= ROOT_DIRECTIONS.len());
        assert!(roots.iter().all(|r| r.depth <= ROOT_MAX_DEPTH));
        // Primary roots start at the seed and head downward
        for r in roots.iter().filter(|r| r.parent.is_none()) {
            assert!(r.start.approx_eq(&t.seed, 1e-4));
            assert!(r.end.y > r.start.y);
        }
    }

    #[test]
    fn test_recursion_is_bounded() {
        let t = tree(99);
        assert!(t.segments.iter().all(|s| s.depth <= BRANCH_MAX_DEPTH.max(ROOT_MAX_DEPTH)));
    }

    #[test]
    fn test_canopy_leaves_above_ground() {
        let mut rng = Rng::new(4);
        let mut p = params(800.0, 600.0);
        p.canopy_leaves = 0;
        let without = generate(&p, &mut rng, &Noise::new(4)).leaves.len();
        let mut rng = Rng::new(4);
        let with = generate(&params(800.0, 600.0), &mut rng, &Noise::new(4));
        assert!(with.leaves.len() > without);
        assert!(with.leaves.len() <= without + 250);
        for leaf in &with.leaves[without..] {
            assert!(leaf.pos.y <= with.ground_y - CANOPY_GROUND_CLEARANCE);
        }
    }

    #[test]
    fn test_same_seed_same_tree() {
        let a = tree(77);
        let b = tree(77);
        assert_eq!(a.segments, b.segments);
        assert_eq!(a.leaves, b.leaves);
    }

    #[test]
    fn test_zero_surface_is_empty() {
        let mut rng = Rng::new(1);
        let t = generate(&params(0.0, 600.0), &mut rng, &Noise::new(1));
        assert!(t.segments.is_empty());
        assert!(t.leaves.is_empty());
    }
}
