//! Shared utilities

use std::collections::VecDeque;
use std::time::Instant;

/// Simple deterministic RNG using xorshift64
/// Every random choice in the scene flows through one of these so a fixed
/// seed reproduces the same tree, the same birds and the same songs.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // Scramble so that small consecutive seeds diverge immediately
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        state = (state ^ (state >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        Self { state: state.max(1) }
    }

    /// Get the next random u64
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Get a random f32 in [0, 1)
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Get a random f32 in [min, max)
    #[inline]
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Get a random usize in [min, max)
    ///
    /// Returns `min` when the range is empty.
    #[inline]
    pub fn range_usize(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min) as u64) as usize
    }

    /// True with probability `p`
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }

    /// Pick a uniformly random element, `None` for an empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.range_usize(0, items.len()))
        }
    }
}

/// HSV to RGB color conversion
/// h: 0-360, s: 0-1, v: 0-1
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let h_prime = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let m = v - c;

    let (r1, g1, b1) = match h_prime as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r1 + m) * 255.0) as u8,
        ((g1 + m) * 255.0) as u8,
        ((b1 + m) * 255.0) as u8,
    )
}

/// A color in HSB space: hue 0-360, saturation and brightness 0-100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsb {
    pub h: f32,
    pub s: f32,
    pub b: f32,
}

impl Hsb {
    pub const fn new(h: f32, s: f32, b: f32) -> Self {
        Self { h, s, b }
    }

    /// Convert to 8-bit RGB, clamping saturation and brightness
    pub fn rgb(self) -> (u8, u8, u8) {
        hsv_to_rgb(
            self.h,
            (self.s / 100.0).clamp(0.0, 1.0),
            (self.b / 100.0).clamp(0.0, 1.0),
        )
    }

    /// Same hue with scaled saturation and shifted brightness
    pub fn shade(self, sat_scale: f32, bright_shift: f32) -> Self {
        Self::new(self.h, self.s * sat_scale, self.b + bright_shift)
    }
}

/// Map an alpha on the 0-100 scale to a blend byte
#[inline]
pub fn alpha(a: f32) -> u8 {
    (a.clamp(0.0, 100.0) * 2.55) as u8
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linearly remap `v` from [in_lo, in_hi] to [out_lo, out_hi] (unclamped)
#[inline]
pub fn remap(v: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    out_lo + (v - in_lo) / (in_hi - in_lo) * (out_hi - out_lo)
}

// ============================================================================
// FPS Counter
// ============================================================================

/// FPS counter with rolling average
pub struct FpsCounter {
    frame_times: VecDeque<f32>,
    last_frame: Instant,
    sample_count: usize,
}

impl FpsCounter {
    /// Create a new FPS counter with specified sample window
    pub fn new(sample_count: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(sample_count),
            last_frame: Instant::now(),
            sample_count,
        }
    }

    /// Call at the start of each frame to record timing
    /// Returns (delta_time, average_fps)
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.sample_count {
            self.frame_times.pop_front();
        }

        (dt, self.avg_fps())
    }

    pub fn avg_fps(&self) -> f32 {
        let avg_dt = self.avg_frame_time();
        if avg_dt > 0.0 {
            1.0 / avg_dt
        } else {
            0.0
        }
    }

    /// Get the average frame time in milliseconds
    pub fn avg_frame_time_ms(&self) -> f32 {
        self.avg_frame_time() * 1000.0
    }

    fn avg_frame_time(&self) -> f32 {
        self.frame_times.iter().sum::<f32>() / self.frame_times.len().max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_rng_ranges() {
        let mut rng = Rng::new(1234);
        for _ in 0..10_000 {
            let f = rng.range_f32(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&f));
            let n = rng.range_usize(2, 5);
            assert!((2..5).contains(&n));
        }
        assert_eq!(rng.range_usize(4, 4), 4);
    }

    #[test]
    fn test_pick_empty() {
        let mut rng = Rng::new(3);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.pick(&[9]), Some(&9));
    }

    #[test]
    fn test_hsb_primaries() {
        assert_eq!(Hsb::new(0.0, 100.0, 100.0).rgb(), (255, 0, 0));
        assert_eq!(Hsb::new(120.0, 100.0, 100.0).rgb(), (0, 255, 0));
        assert_eq!(Hsb::new(0.0, 0.0, 0.0).rgb(), (0, 0, 0));
        // Hue wraps and out-of-range brightness clamps
        assert_eq!(Hsb::new(360.0, 100.0, 140.0).rgb(), (255, 0, 0));
    }

    #[test]
    fn test_alpha_scale() {
        assert_eq!(alpha(0.0), 0);
        assert_eq!(alpha(100.0), 255);
        assert_eq!(alpha(250.0), 255);
        assert_eq!(alpha(-5.0), 0);
    }
}
