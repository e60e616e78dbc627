//! Seeded random streams for generation.
//!
//! Every placement or lookup takes its own stream, so nothing here is shared
//! between workers. Same seed and the same call sequence give the same values.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

/// The draws generation code needs from a random stream.
pub trait GenRandom {
    fn next_u64(&mut self) -> u64;

    /// Uniform in `[0, 1)`.
    fn next_f32(&mut self) -> f32;

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform in `[0, bound)`; `0` when `bound <= 0`.
    fn next_i32(&mut self, bound: i32) -> i32;

    /// Standard normal sample (mean 0, deviation 1).
    fn next_gaussian(&mut self) -> f64;

    /// Normal sample with the given mean and deviation.
    fn next_normal(&mut self, mean: f64, deviation: f64) -> f64 {
        mean + self.next_gaussian() * deviation
    }

    /// Uniform in `[min, max]`; `min` when the range is empty.
    fn range_inclusive(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1).min(i64::from(i32::MAX)) as i32;
        min + self.next_i32(span)
    }

    fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }
}

impl<R: GenRandom + ?Sized> GenRandom for &mut R {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
    fn next_f32(&mut self) -> f32 {
        (**self).next_f32()
    }
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
    fn next_i32(&mut self, bound: i32) -> i32 {
        (**self).next_i32(bound)
    }
    fn next_gaussian(&mut self) -> f64 {
        (**self).next_gaussian()
    }
    fn next_normal(&mut self, mean: f64, deviation: f64) -> f64 {
        (**self).next_normal(mean, deviation)
    }
}

/// ChaCha8-backed stream.
#[derive(Clone, Debug)]
pub struct WorldRandom {
    rng: ChaCha8Rng,
}

impl WorldRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream for one grid cell of a seeded layer.
    pub fn for_cell(seed: u64, x: i32, z: i32) -> Self {
        Self::new(mix_seed(seed, x, z))
    }

    /// Stream for a named sub-system of a world seed.
    pub fn derive(seed: u64, salt: u64) -> Self {
        Self::new(seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl GenRandom for WorldRandom {
    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn next_f32(&mut self) -> f32 {
        self.rng.r#gen::<f32>()
    }

    fn next_f64(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    fn next_i32(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    fn next_gaussian(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    /// Falls back to `mean` when `deviation` is not a valid spread.
    fn next_normal(&mut self, mean: f64, deviation: f64) -> f64 {
        match Normal::new(mean, deviation) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => mean,
        }
    }
}

/// Folds a cell coordinate into a seed. Avalanche steps keep neighbouring
/// cells uncorrelated.
pub fn mix_seed(seed: u64, x: i32, z: i32) -> u64 {
    let mut h = seed
        ^ (x as u32 as u64).wrapping_mul(0x85eb_ca6b_27d4_eb2d)
        ^ (z as u32 as u64).wrapping_mul(0xc2b2_ae35_1656_67b1);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}
