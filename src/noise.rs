//! Coherent Noise
//!
//! Seeded value noise layered into a smooth [0, 1] field. The tree generator
//! samples it by position and recursion depth so neighbouring branches bend
//! together instead of jittering independently.

/// Octaves summed by [`Noise::sample`]
const OCTAVES: u32 = 4;
/// Amplitude falloff per octave
const FALLOFF: f32 = 0.5;

/// Hash-based pseudo-random value for integer grid coordinates.
/// Returns a value in [0.0, 1.0].
#[inline]
pub fn noise_hash(x: i32, y: i32, z: i32, seed: u32) -> f32 {
    let mut h = seed.wrapping_add(x as u32).wrapping_mul(374761393);
    h = h.wrapping_add(y as u32).wrapping_mul(668265263);
    h = h.wrapping_add(z as u32).wrapping_mul(2147483647);
    h = (h ^ (h >> 13)).wrapping_mul(1274126177);
    h = h ^ (h >> 16);
    (h & 0x7fff) as f32 / 0x7fff as f32
}

/// Smoothstep interpolation: 3t² - 2t³
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// 3D value noise with smoothstep interpolation.
/// Returns a value in [0.0, 1.0].
pub fn value_noise(x: f32, y: f32, z: f32, seed: u32) -> f32 {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    let iz = z.floor() as i32;
    let fx = smoothstep(x - ix as f32);
    let fy = smoothstep(y - iy as f32);
    let fz = smoothstep(z - iz as f32);

    let c000 = noise_hash(ix, iy, iz, seed);
    let c100 = noise_hash(ix + 1, iy, iz, seed);
    let c010 = noise_hash(ix, iy + 1, iz, seed);
    let c110 = noise_hash(ix + 1, iy + 1, iz, seed);
    let c001 = noise_hash(ix, iy, iz + 1, seed);
    let c101 = noise_hash(ix + 1, iy, iz + 1, seed);
    let c011 = noise_hash(ix, iy + 1, iz + 1, seed);
    let c111 = noise_hash(ix + 1, iy + 1, iz + 1, seed);

    // Trilinear interpolation
    let x0 = c000 + (c100 - c000) * fx;
    let x1 = c010 + (c110 - c010) * fx;
    let x2 = c001 + (c101 - c001) * fx;
    let x3 = c011 + (c111 - c011) * fx;

    let y0 = x0 + (x1 - x0) * fy;
    let y1 = x2 + (x3 - x2) * fy;

    y0 + (y1 - y0) * fz
}

/// Seeded coherent noise field
#[derive(Debug, Clone, Copy)]
pub struct Noise {
    seed: u32,
    norm: f32,
}

impl Noise {
    pub fn new(seed: u32) -> Self {
        let mut norm = 0.0;
        let mut amplitude = FALLOFF;
        for _ in 0..OCTAVES {
            norm += amplitude;
            amplitude *= FALLOFF;
        }
        Self { seed, norm }
    }

    /// Sample the field at (x, y, z). Always in [0.0, 1.0].
    pub fn sample(&self, x: f32, y: f32, z: f32) -> f32 {
        let mut value = 0.0;
        let mut amplitude = FALLOFF;
        let mut frequency = 1.0;
        for octave in 0..OCTAVES {
            value += amplitude
                * value_noise(
                    x * frequency,
                    y * frequency,
                    z * frequency,
                    self.seed.wrapping_add(octave),
                );
            amplitude *= FALLOFF;
            frequency *= 2.0;
        }
        (value / self.norm).clamp(0.0, 1.0)
    }

    /// Sample remapped to [-amplitude/2, amplitude/2]
    pub fn jitter(&self, x: f32, y: f32, z: f32, amplitude: f32) -> f32 {
        self.sample(x, y, z) * amplitude - amplitude * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_hash_deterministic() {
        assert_eq!(noise_hash(10, 20, 30, 42), noise_hash(10, 20, 30, 42));
    }

    #[test]
    fn test_sample_range() {
        let noise = Noise::new(12345);
        for i in -50..50 {
            for j in -5..5 {
                let v = noise.sample(i as f32 * 0.37, j as f32 * 1.3, 2.5);
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_sample_continuity() {
        let noise = Noise::new(999);
        for i in 0..200 {
            let x = i as f32 * 0.05;
            let v1 = noise.sample(x, 0.3, 1.0);
            let v2 = noise.sample(x + 0.005, 0.3, 1.0);
            assert!((v1 - v2).abs() < 0.1, "noise discontinuity at x={x}");
        }
    }

    #[test]
    fn test_jitter_is_centered() {
        let noise = Noise::new(5);
        for i in 0..100 {
            let j = noise.jitter(i as f32 * 0.1, 0.0, 3.0, 0.5);
            assert!((-0.25..=0.25).contains(&j));
        }
    }

    #[test]
    fn test_seeds_differ() {
        let a = Noise::new(1);
        let b = Noise::new(2);
        let differs = (0..20).any(|i| {
            let x = i as f32 * 0.7 + 0.1;
            (a.sample(x, x, 0.5) - b.sample(x, x, 0.5)).abs() > 1e-4
        });
        assert!(differs);
    }
}
