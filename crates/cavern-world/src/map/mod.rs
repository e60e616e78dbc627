//! Block-coordinate zone maps sampled by [`crate::source::SpatialZoneMap`].

mod square;
mod stack;

use std::sync::Arc;

pub use square::SquareZoneMap;
pub use stack::MapStack;

use crate::tree::{ZoneHandle, ZoneTree};

/// A zone layout over block coordinates.
pub trait ZoneMap: Send {
    fn zone_at(&mut self, x: i32, y: i32, z: i32) -> ZoneHandle;
    fn clear_cache(&mut self);
    fn cache_stats(&self) -> ZoneCacheStats;
}

/// Creates one horizontal map: `(seed, zone_size, tree)`.
pub type ZoneMapBuilder = fn(u64, i32, Arc<ZoneTree>) -> Box<dyn ZoneMap>;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
    pub entries: usize,
}

impl ZoneCacheStats {
    pub fn merge(self, other: ZoneCacheStats) -> ZoneCacheStats {
        ZoneCacheStats {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            clears: self.clears + other.clears,
            entries: self.entries + other.entries,
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
