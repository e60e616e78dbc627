//! Coordinate to zone lookup over a seeded map.

use std::sync::Arc;

use crate::config::ZoneSourceConfig;
use crate::map::{MapStack, SquareZoneMap, ZoneCacheStats, ZoneMap, ZoneMapBuilder};
use crate::tree::{ZoneHandle, ZoneTree};
use crate::zone::{ZoneFilter, ZoneId, ZoneRegistry};

/// Resolves quart coordinates to zones. The map is created by
/// [`SpatialZoneMap::init_map`] and recreated whenever seed, height, config
/// or registry change; until then every lookup returns the sentinel.
pub struct SpatialZoneMap {
    config: ZoneSourceConfig,
    tree: Arc<ZoneTree>,
    builder: ZoneMapBuilder,
    seed: Option<u64>,
    max_height: i32,
    map: Option<Box<dyn ZoneMap>>,
}

impl SpatialZoneMap {
    pub fn new(config: ZoneSourceConfig, registry: Option<&ZoneRegistry>) -> Self {
        Self::with_builder(config, registry, SquareZoneMap::boxed)
    }

    pub fn with_builder(
        config: ZoneSourceConfig,
        registry: Option<&ZoneRegistry>,
        builder: ZoneMapBuilder,
    ) -> Self {
        let tree = Arc::new(ZoneTree::rebuild(registry, &config.filter));
        Self {
            config,
            tree,
            builder,
            seed: None,
            max_height: 256,
            map: None,
        }
    }

    pub fn init_map(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.rebuild_map();
    }

    pub fn set_max_height(&mut self, max_height: i32) {
        if self.max_height != max_height {
            self.max_height = max_height;
            self.rebuild_map();
        }
    }

    /// Replaces the layout config. The tree is rebuilt only when the filter
    /// changed.
    pub fn set_config(&mut self, config: ZoneSourceConfig, registry: Option<&ZoneRegistry>) {
        let filter_changed = config.filter != self.config.filter;
        self.config = config;
        if filter_changed {
            self.tree = Arc::new(ZoneTree::rebuild(registry, &self.config.filter));
        }
        self.rebuild_map();
    }

    /// Swaps in a tree built from a fresh registry snapshot.
    pub fn reload(&mut self, registry: Option<&ZoneRegistry>) {
        self.tree = Arc::new(ZoneTree::rebuild(registry, &self.config.filter));
        self.rebuild_map();
    }

    pub fn tree(&self) -> Arc<ZoneTree> {
        self.tree.clone()
    }

    pub fn config(&self) -> &ZoneSourceConfig {
        &self.config
    }

    pub fn filter(&self) -> &ZoneFilter {
        &self.config.filter
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn max_height(&self) -> i32 {
        self.max_height
    }

    pub fn is_initialized(&self) -> bool {
        self.map.is_some()
    }

    pub fn uses_vertical_stack(&self) -> bool {
        self.config.use_vertical_zones
            && self.max_height as f64 > self.config.zone_size_vertical as f64 * 1.5
    }

    fn rebuild_map(&mut self) {
        let Some(seed) = self.seed else { return };
        let map: Box<dyn ZoneMap> = if self.uses_vertical_stack() {
            Box::new(MapStack::new(
                seed,
                self.config.zone_size,
                self.tree.clone(),
                self.builder,
                self.config.zone_size_vertical,
                self.max_height,
            ))
        } else {
            (self.builder)(seed, self.config.zone_size, self.tree.clone())
        };
        log::debug!(
            target: "zone_map",
            "zone map rebuilt: seed={} height={} vertical={}",
            seed,
            self.max_height,
            self.uses_vertical_stack()
        );
        self.map = Some(map);
    }

    /// Zone at quart coordinates `(x, y, z)`. The cache is dropped whenever
    /// both `x` and `z` sit on a 64-quart boundary.
    pub fn zone_at(&mut self, x: i32, y: i32, z: i32) -> ZoneHandle {
        let Some(map) = self.map.as_mut() else {
            return ZoneHandle::EMPTY;
        };
        if (x & 63) == 0 && (z & 63) == 0 {
            map.clear_cache();
        }
        map.zone_at(x << 2, y << 2, z << 2)
    }

    pub fn zone_id_at(&mut self, x: i32, y: i32, z: i32) -> ZoneId {
        let h = self.zone_at(x, y, z);
        self.tree.id(h).clone()
    }

    pub fn cache_stats(&self) -> ZoneCacheStats {
        self.map
            .as_ref()
            .map(|m| m.cache_stats())
            .unwrap_or_default()
    }
}
