//! Birds — small autonomous visitors that fly in, land and perch
//!
//! Each bird moves through flying → landing → perched exactly once. Perched
//! birds stay on their perch for good; only their drawn pose sways.

use crate::display::PixelBuffer;
use crate::math2d::{Pen, Vec2};
use crate::tree::Structure;
use crate::util::{alpha, Hsb, Rng};
use std::f32::consts::PI;

/// Distance at which a flying bird starts its landing approach
const LANDING_DISTANCE: f32 = 30.0;
/// Distance at which a landing bird snaps onto the perch
const PERCH_DISTANCE: f32 = 3.0;
const LANDING_SPEED_SCALE: f32 = 0.5;
/// Vertical bob added to flight each frame
const FLIGHT_BOB: f32 = 0.8;
/// Horizontal sway of a perched bird (pixels)
pub const PERCH_SWAY: f32 = 1.5;
/// Head bob of a perched bird (pixels)
const HEAD_BOB: f32 = 1.0;
/// Spawn this far beyond the left or right edge
const OFFSCREEN_MARGIN: f32 = 50.0;

const PALETTE: [Hsb; 6] = [
    Hsb::new(35.0, 60.0, 55.0),  // brown
    Hsb::new(210.0, 40.0, 50.0), // blue-gray
    Hsb::new(15.0, 50.0, 60.0),  // robin red
    Hsb::new(50.0, 70.0, 65.0),  // golden
    Hsb::new(0.0, 10.0, 40.0),   // dark gray
    Hsb::new(120.0, 30.0, 45.0), // olive green
];

const BEAK: Hsb = Hsb::new(40.0, 80.0, 70.0);
const EYE: Hsb = Hsb::new(0.0, 0.0, 10.0);
const LEGS: Hsb = Hsb::new(30.0, 30.0, 35.0);

/// Behaviour state. Perch-only animation phases exist only once perched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BirdState {
    Flying,
    Landing,
    Perched {
        sway_phase: f32,
        sway_speed: f32,
        head_bob: f32,
    },
}

impl BirdState {
    /// Position in the one-way lifecycle
    pub fn stage(&self) -> u8 {
        match self {
            Self::Flying => 0,
            Self::Landing => 1,
            Self::Perched { .. } => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bird {
    pub pos: Vec2,
    pub perch: Vec2,
    pub size: f32,
    pub color: Hsb,
    pub state: BirdState,
    pub speed: f32,
    pub wing_speed: f32,
    pub flap_offset: f32,
}

impl Bird {
    /// A new bird entering from a random side, headed for a canopy perch
    pub fn arrive(tree: &Structure, rng: &mut Rng) -> Self {
        let (w, h) = (tree.width, tree.height);
        let x = if rng.chance(0.5) {
            -OFFSCREEN_MARGIN
        } else {
            w + OFFSCREEN_MARGIN
        };
        let y = rng.range_f32(h * 0.05, h * 0.3);

        let angle = rng.range_f32(-PI * 0.85, -PI * 0.15);
        let dist = rng.range_f32(w * 0.05, w * 0.35);
        let lift = rng.range_f32(0.0, h * 0.05);
        let perch = Vec2::new(
            tree.trunk_top.x + angle.cos() * dist,
            tree.trunk_top.y + (angle * 0.5).sin() * dist * 0.3 - lift,
        );

        Self {
            pos: Vec2::new(x, y),
            perch,
            size: rng.range_f32(12.0, 18.0),
            color: rng.pick(&PALETTE).copied().unwrap_or(PALETTE[0]),
            state: BirdState::Flying,
            speed: rng.range_f32(2.5, 5.0),
            wing_speed: rng.range_f32(8.0, 14.0),
            flap_offset: rng.range_f32(0.0, 1000.0),
        }
    }

    pub fn is_perched(&self) -> bool {
        matches!(self.state, BirdState::Perched { .. })
    }

    /// Advance one frame. `frame` is the scene's frame counter.
    pub fn update(&mut self, frame: u64, rng: &mut Rng) {
        match self.state {
            BirdState::Flying => {
                let to_perch = self.perch - self.pos;
                let dist = to_perch.length();
                if dist < LANDING_DISTANCE {
                    self.state = BirdState::Landing;
                } else {
                    self.pos += to_perch * (self.speed / dist);
                    self.pos.y += (frame as f32 * 0.08 + self.flap_offset).sin() * FLIGHT_BOB;
                }
            },
            BirdState::Landing => {
                let to_perch = self.perch - self.pos;
                let dist = to_perch.length();
                if dist < PERCH_DISTANCE {
                    self.pos = self.perch;
                    self.state = BirdState::Perched {
                        sway_phase: rng.range_f32(0.0, 1000.0),
                        sway_speed: rng.range_f32(0.3, 1.0),
                        head_bob: rng.range_f32(0.0, 1000.0),
                    };
                    log::debug!("bird perched at ({:.0}, {:.0})", self.perch.x, self.perch.y);
                } else {
                    let step = (self.speed * LANDING_SPEED_SCALE).min(dist);
                    self.pos += to_perch * (step / dist);
                }
            },
            BirdState::Perched { .. } => {},
        }
    }

    /// Drawn offset of a perched bird from its perch (zero otherwise)
    pub fn sway(&self, drift: f32) -> Vec2 {
        match self.state {
            BirdState::Perched {
                sway_phase,
                sway_speed,
                ..
            } => Vec2::new((drift * 40.0 * sway_speed + sway_phase).sin() * PERCH_SWAY, 0.0),
            _ => Vec2::zero(),
        }
    }

    pub fn render(&self, buffer: &mut PixelBuffer, frame: u64, drift: f32) {
        match self.state {
            BirdState::Flying | BirdState::Landing => self.render_flight(buffer, frame),
            BirdState::Perched { head_bob, .. } => {
                let bob = (frame as f32 * 0.05 + head_bob).sin() * HEAD_BOB;
                self.render_perched(buffer, self.pos + self.sway(drift), bob);
            },
        }
    }

    /// Side profile with a flapping wing, facing the perch
    fn render_flight(&self, buffer: &mut PixelBuffer, frame: u64) {
        let sz = self.size;
        let flap = (frame as f32 * self.wing_speed * 0.1 + self.flap_offset).sin();
        let facing = self.perch.x - self.pos.x;
        let pen = Pen::new(self.pos).facing(facing);
        let c = self.color;

        ellipse(buffer, &pen, 0.0, 0.0, sz * 2.0, sz * 1.2, 0.0, c, 80.0);
        ellipse(buffer, &pen, sz * 0.9, -sz * 0.2, sz * 0.9, sz * 0.8, 0.0, c.shade(0.8, 10.0), 85.0);
        triangle(
            buffer,
            &pen,
            [(sz * 1.3, -sz * 0.2), (sz * 1.7, -sz * 0.1), (sz * 1.3, 0.0)],
            BEAK,
            90.0,
        );
        ellipse(buffer, &pen, sz * 1.05, -sz * 0.3, sz * 0.15, sz * 0.15, 0.0, EYE, 90.0);

        let wing = pen.rotated(flap * 0.7 * 0.8);
        let wing_color = Hsb::new(c.h, c.s + 10.0, c.b - 5.0);
        ellipse(buffer, &wing, -sz * 0.2, -sz * 0.3, sz * 1.8, sz * 0.5, 0.0, wing_color, 70.0);

        triangle(
            buffer,
            &pen,
            [(-sz * 0.8, 0.0), (-sz * 1.6, -sz * 0.3), (-sz * 1.6, sz * 0.3)],
            c.shade(1.0, -8.0),
            65.0,
        );
    }

    /// Resting pose: folded wing, legs, bobbing head
    fn render_perched(&self, buffer: &mut PixelBuffer, at: Vec2, bob: f32) {
        let sz = self.size;
        let pen = Pen::new(at);
        let c = self.color;

        ellipse(buffer, &pen, 0.0, 0.0, sz * 1.6, sz * 1.4, 0.0, c, 80.0);
        ellipse(buffer, &pen, sz * 0.5, -sz * 0.5 + bob, sz * 0.85, sz * 0.75, 0.0, c.shade(0.8, 10.0), 85.0);
        triangle(
            buffer,
            &pen,
            [
                (sz * 0.9, -sz * 0.5 + bob),
                (sz * 1.3, -sz * 0.4 + bob),
                (sz * 0.9, -sz * 0.3 + bob),
            ],
            BEAK,
            90.0,
        );
        ellipse(buffer, &pen, sz * 0.65, -sz * 0.6 + bob, sz * 0.12, sz * 0.12, 0.0, EYE, 90.0);
        ellipse(
            buffer,
            &pen,
            -sz * 0.1,
            sz * 0.1,
            sz * 1.4,
            sz * 0.8,
            0.0,
            Hsb::new(c.h, c.s + 5.0, c.b - 5.0),
            60.0,
        );
        triangle(
            buffer,
            &pen,
            [(-sz * 0.6, sz * 0.2), (-sz * 1.3, sz * 0.1), (-sz * 1.2, sz * 0.5)],
            c.shade(1.0, -8.0),
            60.0,
        );

        let (r, g, b) = LEGS.rgb();
        for leg_x in [sz * 0.1, -sz * 0.2] {
            let top = pen.at(leg_x, sz * 0.6);
            let foot = pen.at(leg_x, sz);
            buffer.line_aa_blend(top.x, top.y, foot.x, foot.y, r, g, b, alpha(50.0));
        }
    }
}

/// Ellipse given by its full width/height in the pen's local frame
fn ellipse(
    buffer: &mut PixelBuffer,
    pen: &Pen,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    angle: f32,
    color: Hsb,
    a: f32,
) {
    let center = pen.at(x, y);
    let (r, g, b) = color.rgb();
    buffer.fill_ellipse_blend(center.x, center.y, w * 0.5, h * 0.5, pen.angle(angle), r, g, b, alpha(a));
}

fn triangle(buffer: &mut PixelBuffer, pen: &Pen, points: [(f32, f32); 3], color: Hsb, a: f32) {
    let verts = points.map(|(x, y)| {
        let p = pen.at(x, y);
        (p.x, p.y)
    });
    let (r, g, b) = color.rgb();
    buffer.fill_polygon_blend(&verts, r, g, b, alpha(a));
}

/// The bird population
pub struct Flock {
    birds: Vec<Bird>,
    cap: usize,
}

impl Flock {
    pub fn new(cap: usize) -> Self {
        Self {
            birds: Vec::with_capacity(cap),
            cap,
        }
    }

    /// Add a bird unless the population is already at the cap
    pub fn spawn(&mut self, tree: &Structure, rng: &mut Rng) -> bool {
        if self.birds.len() >= self.cap {
            return false;
        }
        let bird = Bird::arrive(tree, rng);
        log::debug!(
            "bird arriving from x={:.0}, perch ({:.0}, {:.0})",
            bird.pos.x,
            bird.perch.x,
            bird.perch.y
        );
        self.birds.push(bird);
        true
    }

    pub fn update(&mut self, frame: u64, rng: &mut Rng) {
        for bird in &mut self.birds {
            bird.update(frame, rng);
        }
    }

    pub fn render(&self, buffer: &mut PixelBuffer, frame: u64, drift: f32) {
        for bird in &self.birds {
            bird.render(buffer, frame, drift);
        }
    }

    pub fn birds(&self) -> &[Bird] {
        &self.birds
    }

    pub fn len(&self) -> usize {
        self.birds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.birds.is_empty()
    }

    pub fn has_room(&self) -> bool {
        self.birds.len() < self.cap
    }

    pub fn clear(&mut self) {
        self.birds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::Noise;
    use crate::tree::{generate, Params};

    fn tree() -> Structure {
        let mut rng = Rng::new(3);
        let params = Params {
            width: 800.0,
            height: 600.0,
            canopy_leaves: 50,
            reveal_tail: 0.06,
        };
        generate(&params, &mut rng, &Noise::new(3))
    }

    #[test]
    fn test_spawns_offscreen_flying() {
        let tree = tree();
        let mut rng = Rng::new(10);
        for _ in 0..50 {
            let bird = Bird::arrive(&tree, &mut rng);
            assert_eq!(bird.state, BirdState::Flying);
            assert!(bird.pos.x < 0.0 || bird.pos.x > tree.width);
            assert!(bird.perch.y < tree.ground_y);
        }
    }

    #[test]
    fn test_lifecycle_is_one_way() {
        let tree = tree();
        let mut rng = Rng::new(11);
        for _ in 0..10 {
            let mut bird = Bird::arrive(&tree, &mut rng);
            let mut stage = bird.state.stage();
            for frame in 0..5000 {
                bird.update(frame, &mut rng);
                let next = bird.state.stage();
                assert!(next >= stage && next <= stage + 1);
                stage = next;
            }
            assert!(bird.is_perched(), "bird never perched");
        }
    }

    #[test]
    fn test_perched_stays_within_sway() {
        let tree = tree();
        let mut rng = Rng::new(12);
        let mut bird = Bird::arrive(&tree, &mut rng);
        let mut frame = 0;
        while !bird.is_perched() {
            bird.update(frame, &mut rng);
            frame += 1;
            assert!(frame < 10_000);
        }
        assert_eq!(bird.pos, bird.perch);

        for f in frame..frame + 2000 {
            bird.update(f, &mut rng);
            assert_eq!(bird.pos, bird.perch);
            let drawn = bird.pos + bird.sway(f as f32 * 0.003);
            assert!(drawn.distance(bird.perch) <= PERCH_SWAY + 1e-4);
        }
    }

    #[test]
    fn test_sway_only_when_perched() {
        let tree = tree();
        let mut rng = Rng::new(13);
        let bird = Bird::arrive(&tree, &mut rng);
        assert_eq!(bird.sway(12.0), Vec2::zero());
    }

    #[test]
    fn test_population_capped() {
        let tree = tree();
        let mut rng = Rng::new(14);
        let mut flock = Flock::new(4);
        for _ in 0..20 {
            flock.spawn(&tree, &mut rng);
            assert!(flock.len() <= 4);
        }
        assert_eq!(flock.len(), 4);
        assert!(!flock.has_room());
        flock.clear();
        assert!(flock.is_empty());
    }

    #[test]
    fn test_render_draws_something() {
        let tree = tree();
        let mut rng = Rng::new(15);
        let mut bird = Bird::arrive(&tree, &mut rng);
        bird.pos = Vec2::new(100.0, 100.0);
        let mut buffer = PixelBuffer::with_size(200, 200);
        buffer.clear(0, 0, 0);
        bird.render(&mut buffer, 0, 0.0);
        assert_ne!(buffer.get_pixel(100, 100), Some((0, 0, 0)));
    }
}
