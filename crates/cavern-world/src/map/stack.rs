use std::sync::Arc;

use fastnoise_lite::{FastNoiseLite, NoiseType};

use super::{ZoneCacheStats, ZoneMap, ZoneMapBuilder};
use crate::rng::mix_seed;
use crate::tree::{ZoneHandle, ZoneTree};

/// Horizontal maps stacked in height bands. Band borders are pushed up and
/// down by a low-frequency noise field.
pub struct MapStack {
    maps: Vec<Box<dyn ZoneMap>>,
    noise: FastNoiseLite,
    world_height: i32,
    min_value: i32,
    max_value: i32,
    max_index: i32,
    distortion: i32,
}

impl MapStack {
    pub fn new(
        seed: u64,
        zone_size: i32,
        tree: Arc<ZoneTree>,
        builder: ZoneMapBuilder,
        band_height: i32,
        world_height: i32,
    ) -> Self {
        let band_height = band_height.max(1);
        let world_height = world_height.max(1);
        let map_count = ((world_height + band_height - 1) / band_height).max(1);
        let maps = (0..map_count)
            .map(|i| builder(mix_seed(seed, i, 0x5eed), zone_size, tree.clone()))
            .collect();
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(1.0));
        Self {
            maps,
            noise,
            world_height,
            min_value: (band_height as f64 * 0.5 + 0.5).floor() as i32,
            max_value: (world_height as f64 - band_height as f64 * 0.5 + 0.5).floor() as i32,
            max_index: map_count - 1,
            distortion: band_height >> 2,
        }
    }

    pub fn band_count(&self) -> usize {
        self.maps.len()
    }

    /// Band sampled at block `(x, y, z)`.
    pub fn band_index(&self, x: i32, y: i32, z: i32) -> usize {
        if y < self.min_value {
            return 0;
        }
        if y > self.max_value {
            return self.max_index as usize;
        }
        let n = self.noise.get_noise_2d(x as f32 * 0.03, z as f32 * 0.03) as f64;
        let shifted = y as f64 + n * self.distortion as f64;
        let idx = (shifted / self.world_height as f64 * self.max_index as f64 + 0.5).floor() as i32;
        idx.clamp(0, self.max_index) as usize
    }
}

impl ZoneMap for MapStack {
    fn zone_at(&mut self, x: i32, y: i32, z: i32) -> ZoneHandle {
        let i = self.band_index(x, y, z);
        self.maps[i].zone_at(x, y, z)
    }

    fn clear_cache(&mut self) {
        for m in &mut self.maps {
            m.clear_cache();
        }
    }

    fn cache_stats(&self) -> ZoneCacheStats {
        self.maps
            .iter()
            .map(|m| m.cache_stats())
            .fold(ZoneCacheStats::default(), ZoneCacheStats::merge)
    }
}
