//! Probability fields over a planar face
//!
//! Feature placement treats the field as an opaque collaborator: given the
//! face shape, a fractal dimension and an optional seed it returns one
//! non-negative weight per face cell. Two generators ship with the crate:
//! [`UniformField`] (every cell equally likely) and [`GradientNoiseField`]
//! (multi-octave gradient noise whose roughness follows the fractal
//! dimension).

use rand::Rng;

use crate::core_types::FaceArray;
use crate::error::Result;

/// Produces a 2D field of non-negative weights over a face.
pub trait SurfaceProbabilityField {
    /// Generate weights for a face of `(rows, cols)` cells
    ///
    /// # Arguments
    ///
    /// * `shape` - Face extents in cells along its two in-plane axes
    /// * `dimension` - Fractal dimension (≥ 0)
    /// * `seed` - Seed for reproducible output; `None` draws a fresh one
    ///
    /// # Errors
    ///
    /// Implementations may reject a shape or dimension they cannot handle
    fn generate(
        &self,
        shape: (usize, usize),
        dimension: f64,
        seed: Option<u64>,
    ) -> Result<FaceArray<f64>>;
}

/// Every face cell gets the same weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformField;

impl SurfaceProbabilityField for UniformField {
    fn generate(
        &self,
        shape: (usize, usize),
        _dimension: f64,
        _seed: Option<u64>,
    ) -> Result<FaceArray<f64>> {
        Ok(FaceArray::filled(shape.0, shape.1, 1.0))
    }
}

/// Permutation table size (must be power of 2).
const PERM_SIZE: usize = 256;

/// Multi-octave gradient noise scaled to `[0, 1]`.
///
/// Octave `i` samples at frequency `base_frequency * 2^i` (cycles per cell)
/// with amplitude `gain^i`, where `gain = 2^-H` and the Hurst exponent
/// `H = 3 - D` is clamped to `[0, 1]`. Higher dimensions keep more energy in
/// the fine octaves and so give rougher fields.
#[derive(Debug, Clone)]
pub struct GradientNoiseField {
    /// Number of octaves summed
    pub octaves: u32,
    /// Frequency of the coarsest octave (cycles per cell)
    pub base_frequency: f64,
}

impl Default for GradientNoiseField {
    fn default() -> Self {
        Self {
            octaves: 5,
            base_frequency: 1.0 / 16.0,
        }
    }
}

impl GradientNoiseField {
    /// Amplitude ratio between successive octaves for a fractal dimension
    pub fn octave_gain(dimension: f64) -> f64 {
        let hurst = (3.0 - dimension).clamp(0.0, 1.0);
        2.0_f64.powf(-hurst)
    }
}

impl SurfaceProbabilityField for GradientNoiseField {
    fn generate(
        &self,
        shape: (usize, usize),
        dimension: f64,
        seed: Option<u64>,
    ) -> Result<FaceArray<f64>> {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        let lattice = Lattice::new(seed);
        let gain = Self::octave_gain(dimension);

        let (rows, cols) = shape;
        let mut field = FaceArray::filled(rows, cols, 0.0);
        let raw = field.as_mut_slice();
        for a in 0..rows {
            for b in 0..cols {
                // Sample at cell centres; lattice points are always zero
                let (x, y) = (a as f64 + 0.5, b as f64 + 0.5);
                let mut total = 0.0;
                let mut frequency = self.base_frequency;
                let mut amplitude = 1.0;
                for _ in 0..self.octaves {
                    total += lattice.noise(x * frequency, y * frequency) * amplitude;
                    frequency *= 2.0;
                    amplitude *= gain;
                }
                raw[a * cols + b] = total;
            }
        }

        rescale_unit(raw);
        Ok(field)
    }
}

/// Rescale values linearly onto `[0, 1]`; a constant field becomes all ones.
fn rescale_unit(values: &mut [f64]) {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    if span > f64::EPSILON {
        for v in values.iter_mut() {
            *v = (*v - min) / span;
        }
    } else {
        values.fill(1.0);
    }
}

/// Seeded gradient lattice for 2D Perlin-style noise.
struct Lattice {
    perm: Vec<u8>,
}

impl Lattice {
    fn new(seed: u64) -> Self {
        let mut perm: Vec<u8> = (0..=255).collect();

        // Fisher-Yates shuffle with MINSTD LCG
        let mut state = seed % 2_147_483_647;
        if state == 0 {
            state = 1;
        }
        for i in (1..PERM_SIZE).rev() {
            state = (state * 48_271) % 2_147_483_647;
            let j = (state as usize) % (i + 1);
            perm.swap(i, j);
        }

        // Doubled to avoid modulo in the hash
        let mut doubled = perm.clone();
        doubled.extend_from_slice(&perm);
        Self { perm: doubled }
    }

    fn noise(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let fx = x - x.floor();
        let fy = y - y.floor();

        let sx = smootherstep(fx);
        let sy = smootherstep(fy);

        let n00 = self.gradient_dot(x0, y0, fx, fy);
        let n10 = self.gradient_dot(x0 + 1, y0, fx - 1.0, fy);
        let n01 = self.gradient_dot(x0, y0 + 1, fx, fy - 1.0);
        let n11 = self.gradient_dot(x0 + 1, y0 + 1, fx - 1.0, fy - 1.0);

        let nx0 = lerp(n00, n10, sx);
        let nx1 = lerp(n01, n11, sx);
        lerp(nx0, nx1, sy)
    }

    fn gradient_dot(&self, ix: i64, iy: i64, dx: f64, dy: f64) -> f64 {
        use std::f64::consts::FRAC_1_SQRT_2;
        const GRADIENTS: [(f64, f64); 8] = [
            (1.0, 0.0),
            (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            (0.0, 1.0),
            (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            (-1.0, 0.0),
            (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
            (0.0, -1.0),
            (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
        ];
        let px = (ix & 0xFF) as usize;
        let py = (iy & 0xFF) as usize;
        let g = GRADIENTS[(self.perm[self.perm[px] as usize + py] as usize) & 0x07];
        g.0 * dx + g.1 * dy
    }
}

/// 6t^5 - 15t^4 + 10t^3
#[inline]
fn smootherstep(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
