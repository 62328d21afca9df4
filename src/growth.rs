//! Growth progress shared by every part of the tree
//!
//! One scalar in [0, 1] advanced by a fixed amount every simulation step. Elements compare
//! their threshold against it to decide how much of themselves to show.

use crate::math2d::Vec2;
use crate::tree::Segment;

#[derive(Debug, Clone)]
pub struct Growth {
    progress: f32,
    rate: f32,
}

impl Growth {
    pub fn new(rate: f32) -> Self {
        Self {
            progress: 0.0,
            rate: rate.max(0.0),
        }
    }

    /// Advance one step. Never exceeds 1 and never decreases.
    pub fn advance(&mut self) {
        if self.progress < 1.0 {
            self.progress = (self.progress + self.rate).min(1.0);
        }
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Start over from bare ground
    pub fn reset(&mut self) {
        self.progress = 0.0;
    }
}

/// Reveal fraction of an element: `None` before its threshold, then ramps
/// linearly from 0 to 1 over `window`.
#[inline]
pub fn reveal(progress: f32, threshold: f32, window: f32) -> Option<f32> {
    if progress < threshold {
        None
    } else {
        Some(((progress - threshold) / window).clamp(0.0, 1.0))
    }
}

/// Current drawn end point of a segment: extends from `start` toward `end`
/// as it reveals. `None` while the segment is still hidden.
pub fn segment_tip(segment: &Segment, progress: f32, window: f32) -> Option<Vec2> {
    reveal(progress, segment.grow_at, window).map(|t| segment.start.lerp(segment.end, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Hsb;

    fn segment(grow_at: f32) -> Segment {
        Segment {
            start: Vec2::new(0.0, 0.0),
            end: Vec2::new(10.0, 0.0),
            thickness: 2.0,
            grow_at,
            color: Hsb::new(30.0, 40.0, 30.0),
            is_root: false,
            depth: 0,
            parent: None,
        }
    }

    #[test]
    fn test_monotonic_and_clamped() {
        let mut growth = Growth::new(0.001);
        let mut last = growth.progress();
        for _ in 0..1500 {
            growth.advance();
            assert!(growth.progress() >= last);
            assert!(growth.progress() <= 1.0);
            last = growth.progress();
        }
        assert!(growth.is_complete());
    }

    #[test]
    fn test_completes_in_expected_frames() {
        let mut growth = Growth::new(0.001);
        let mut frames = 0;
        while !growth.is_complete() {
            growth.advance();
            frames += 1;
        }
        // ~1000 frames is ~17 s at 60 fps
        assert!((995..=1001).contains(&frames), "took {frames} frames");
    }

    #[test]
    fn test_segment_hidden_before_threshold() {
        let seg = segment(0.4);
        assert!(segment_tip(&seg, 0.39, 0.05).is_none());
        let tip = segment_tip(&seg, 0.4, 0.05).unwrap();
        assert!(tip.approx_eq(&seg.start, 1e-6));
    }

    #[test]
    fn test_segment_extends_then_full() {
        let seg = segment(0.4);
        let mid = segment_tip(&seg, 0.425, 0.05).unwrap();
        assert!((mid.x - 5.0).abs() < 1e-3);
        let full = segment_tip(&seg, 0.45, 0.05).unwrap();
        assert!(full.approx_eq(&seg.end, 1e-5));
        let later = segment_tip(&seg, 0.9, 0.05).unwrap();
        assert!(later.approx_eq(&seg.end, 1e-6));
    }

    #[test]
    fn test_reveal_ramp() {
        assert_eq!(reveal(0.1, 0.2, 0.06), None);
        assert_eq!(reveal(0.2, 0.2, 0.06), Some(0.0));
        assert_eq!(reveal(1.0, 0.2, 0.06), Some(1.0));
    }

    #[test]
    fn test_reset_starts_over() {
        let mut growth = Growth::new(0.5);
        growth.advance();
        growth.advance();
        assert!(growth.is_complete());
        growth.reset();
        assert_eq!(growth.progress(), 0.0);
    }
}
