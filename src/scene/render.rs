use super::Scene;
use crate::display::PixelBuffer;
use crate::growth::{reveal, segment_tip};
use crate::math2d::Pen;
use crate::util::{alpha, remap, Hsb};

const BACKGROUND: Hsb = Hsb::new(30.0, 20.0, 3.0);
const GROUND_BAND: Hsb = Hsb::new(25.0, 30.0, 12.0);
const GROUND: Hsb = Hsb::new(20.0, 25.0, 8.0);
const SEED_HALO: Hsb = Hsb::new(35.0, 60.0, 50.0);
const SEED: Hsb = Hsb::new(35.0, 70.0, 45.0);
const GROUND_GLOW: Hsb = Hsb::new(35.0, 40.0, 30.0);
const CANOPY_SHADE: Hsb = Hsb::new(90.0, 20.0, 15.0);

const SEGMENT_ALPHA: f32 = 70.0;
/// Seed glow is drawn until growth passes this point
const SEED_GLOW_UNTIL: f32 = 0.2;

impl Scene {
    /// Draw the current frame. Reads state only.
    pub fn render(&self, buffer: &mut PixelBuffer) {
        let (r, g, b) = BACKGROUND.rgb();
        buffer.clear(r, g, b);

        self.render_ground(buffer);
        if self.progress() < SEED_GLOW_UNTIL {
            self.render_seed(buffer);
        }
        self.render_segments(buffer);
        self.render_leaves(buffer);
        self.leaf_fall.render(buffer);
        self.flock.render(buffer, self.frame, self.drift);
        self.render_ambience(buffer);
    }

    fn render_ground(&self, buffer: &mut PixelBuffer) {
        let ground = self.structure.ground_y as i32;
        let depth = (self.height as i32 - ground).max(0) as u32;

        let (r, g, b) = GROUND_BAND.rgb();
        for i in 0..3 {
            let a = alpha(8.0 - i as f32 * 2.0);
            buffer.fill_rect_blend(0, ground + i * 2, self.width, depth, r, g, b, a);
        }
        let (r, g, b) = GROUND.rgb();
        buffer.fill_rect_blend(0, ground, self.width, depth, r, g, b, alpha(6.0));
    }

    /// Pulsing glow marking where the tree will sprout
    fn render_seed(&self, buffer: &mut PixelBuffer) {
        let seed = self.structure.seed;
        let strength = remap(self.progress(), 0.0, 0.15, 0.0, 50.0);
        let pulse = 8.0 + (self.frame as f32 * 0.05).sin() * 3.0;

        let (r, g, b) = SEED_HALO.rgb();
        buffer.fill_circle_blend(seed.x, seed.y, pulse * 2.0, r, g, b, alpha(strength * 0.3));
        let (r, g, b) = SEED.rgb();
        buffer.fill_ellipse_blend(seed.x, seed.y, pulse * 0.5, pulse * 0.35, 0.0, r, g, b, alpha(strength));
    }

    fn render_segments(&self, buffer: &mut PixelBuffer) {
        let progress = self.progress();
        let grown = self.growth.is_complete();
        let window = self.config.growth.segment_reveal;

        for seg in &self.structure.segments {
            let Some(tip) = segment_tip(seg, progress, window) else {
                continue;
            };
            let boost = if seg.is_root && grown {
                0.7 + (self.drift * 80.0 + seg.start.x * 0.01).sin() * 0.3
            } else {
                1.0
            };
            let (r, g, b) = seg.color.rgb();
            buffer.line_thick_blend(
                seg.start.x,
                seg.start.y,
                tip.x,
                tip.y,
                seg.thickness,
                r,
                g,
                b,
                alpha(SEGMENT_ALPHA * boost),
            );
        }
    }

    /// Each leaf is a soft halo, a body and a lighter highlight
    fn render_leaves(&self, buffer: &mut PixelBuffer) {
        let progress = self.progress();
        let window = self.config.growth.leaf_reveal;

        for leaf in &self.structure.leaves {
            let Some(t) = reveal(progress, leaf.grow_at, window) else {
                continue;
            };
            let sz = leaf.size * t;
            if sz <= 0.0 {
                continue;
            }
            let offset = self.leaf_offset(leaf);
            let pen = Pen::new(leaf.pos + offset).rotated(leaf.angle + offset.x * 0.05);
            let c = leaf.color;

            let center = pen.at(0.0, 0.0);
            let (r, g, b) = c.shade(0.5, 0.0).rgb();
            buffer.fill_circle_blend(center.x, center.y, sz * 1.5, r, g, b, alpha(8.0 * t));

            let (r, g, b) = c.rgb();
            buffer.fill_ellipse_blend(
                center.x,
                center.y,
                sz * 0.5,
                sz * 0.7,
                pen.angle(0.0),
                r,
                g,
                b,
                alpha(45.0 * t),
            );

            let light = pen.at(sz * 0.25, -sz * 0.15);
            let (r, g, b) = Hsb::new(c.h + 10.0, c.s * 0.8, c.b + 5.0).rgb();
            buffer.fill_ellipse_blend(
                light.x,
                light.y,
                sz * 0.4,
                sz * 0.55,
                pen.angle(0.0),
                r,
                g,
                b,
                alpha(30.0 * t),
            );
        }
    }

    /// Ground glow and canopy shade, fading in as the tree matures
    fn render_ambience(&self, buffer: &mut PixelBuffer) {
        let progress = self.progress();
        let seed = self.structure.seed;
        let (w, h) = (self.width as f32, self.height as f32);

        if progress > 0.4 {
            let a = remap(progress, 0.4, 1.0, 0.0, 4.0);
            let (r, g, b) = GROUND_GLOW.rgb();
            buffer.fill_ellipse_blend(seed.x, self.structure.ground_y, w * 0.3, 25.0, 0.0, r, g, b, alpha(a));
        }

        if progress > 0.7 {
            let a = remap(progress, 0.7, 1.0, 0.0, 12.0);
            let (r, g, b) = CANOPY_SHADE.rgb();
            buffer.fill_ellipse_blend(seed.x, seed.y - h * 0.38, w * 0.55, h * 0.25, 0.0, r, g, b, alpha(a));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn small_scene() -> Scene {
        let mut config = Config::default();
        config.foliage.canopy_leaves = 40;
        Scene::new(320, 240, config, 21, None)
    }

    #[test]
    fn test_bare_frame_is_background_above_ground() {
        let scene = small_scene();
        let mut buffer = PixelBuffer::with_size(320, 240);
        scene.render(&mut buffer);
        assert_eq!(buffer.get_pixel(5, 5), Some(BACKGROUND.rgb()));
    }

    #[test]
    fn test_grown_tree_is_drawn() {
        let mut scene = small_scene();
        while scene.progress() < 1.0 {
            scene.tick(1.0 / 60.0);
        }
        let mut buffer = PixelBuffer::with_size(320, 240);
        scene.render(&mut buffer);

        // Middle of the first trunk segment
        let tree = scene.structure();
        let trunk = tree.segments.iter().find(|s| !s.is_root).unwrap();
        let mid = trunk.start.lerp(trunk.end, 0.5);
        let px = buffer.get_pixel(mid.x as i32, mid.y as i32);
        assert!(px.is_some());
        assert_ne!(px, Some(BACKGROUND.rgb()));
    }

    #[test]
    fn test_render_does_not_change_state() {
        let mut scene = small_scene();
        for _ in 0..100 {
            scene.tick(1.0 / 60.0);
        }
        let (frame, progress) = (scene.frame(), scene.progress());
        let mut buffer = PixelBuffer::with_size(320, 240);
        scene.render(&mut buffer);
        scene.render(&mut buffer);
        assert_eq!(scene.frame(), frame);
        assert_eq!(scene.progress(), progress);
    }
}
