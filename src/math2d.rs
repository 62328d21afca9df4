//! 2D math for the tree, the birds and the particles

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// 2D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Unit vector pointing along `angle` (radians, y down)
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { x: cos, y: sin }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance(&self, other: Self) -> f32 {
        (*self - other).length()
    }

    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// Rotate counter-clockwise in screen space
    #[inline]
    pub fn rotate(&self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Approximate equality check for floating point comparison
    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, s: f32) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Local drawing frame: translate, then mirror horizontally, then rotate.
///
/// Shapes are described in the frame's own coordinates and mapped to screen
/// space with [`Pen::at`]. Angles passed through [`Pen::angle`] account for
/// the mirror so rotated ellipses keep their orientation.
#[derive(Debug, Clone, Copy)]
pub struct Pen {
    origin: Vec2,
    flip: f32,
    rotation: f32,
}

impl Pen {
    pub fn new(origin: Vec2) -> Self {
        Self {
            origin,
            flip: 1.0,
            rotation: 0.0,
        }
    }

    /// Mirror the local x axis when `facing` is negative
    pub fn facing(mut self, facing: f32) -> Self {
        self.flip = if facing < 0.0 { -1.0 } else { 1.0 };
        self
    }

    /// Additional rotation applied in local space (before mirroring)
    pub fn rotated(mut self, angle: f32) -> Self {
        self.rotation += angle;
        self
    }

    /// Map a local point to screen space
    pub fn at(&self, x: f32, y: f32) -> Vec2 {
        let local = Vec2::new(x, y).rotate(self.rotation);
        self.origin + Vec2::new(local.x * self.flip, local.y)
    }

    /// Map a local angle to screen space
    pub fn angle(&self, local: f32) -> f32 {
        let a = local + self.rotation;
        if self.flip < 0.0 {
            std::f32::consts::PI - a
        } else {
            a
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_from_angle_and_rotate() {
        let down = Vec2::from_angle(FRAC_PI_2);
        assert!(down.approx_eq(&Vec2::new(0.0, 1.0), 1e-6));
        let r = Vec2::new(1.0, 0.0).rotate(FRAC_PI_2);
        assert!(r.approx_eq(&Vec2::new(0.0, 1.0), 1e-6));
    }

    #[test]
    fn test_lerp_and_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(6.0, 8.0);
        assert!((a.distance(b) - 10.0).abs() < 1e-6);
        assert!(a.lerp(b, 0.5).approx_eq(&Vec2::new(3.0, 4.0), 1e-6));
    }

    #[test]
    fn test_pen_mirror() {
        let pen = Pen::new(Vec2::new(100.0, 50.0)).facing(-1.0);
        assert!(pen.at(10.0, 2.0).approx_eq(&Vec2::new(90.0, 52.0), 1e-5));
        let pen = Pen::new(Vec2::new(100.0, 50.0)).facing(1.0);
        assert!(pen.at(10.0, 2.0).approx_eq(&Vec2::new(110.0, 52.0), 1e-5));
    }
}
