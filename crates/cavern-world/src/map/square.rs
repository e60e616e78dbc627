use std::sync::Arc;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use hashbrown::HashMap;

use super::{ZoneCacheStats, ZoneMap};
use crate::rng::{WorldRandom, mix_seed};
use crate::tree::{ZoneHandle, ZoneTree};

/// Square cells of `size` blocks, each holding one zone, with borders bent by
/// two noise fields so they do not run on the grid.
pub struct SquareZoneMap {
    seed: u64,
    size: i32,
    tree: Arc<ZoneTree>,
    warp_x: FastNoiseLite,
    warp_z: FastNoiseLite,
    warp_amplitude: f32,
    cells: HashMap<(i32, i32), ZoneHandle>,
    points: HashMap<(i32, i32), ZoneHandle>,
    stats: ZoneCacheStats,
}

impl SquareZoneMap {
    pub fn new(seed: u64, size: i32, tree: Arc<ZoneTree>) -> Self {
        let size = size.max(1);
        let freq = 1.0 / size as f32;
        let mut warp_x = FastNoiseLite::with_seed(mix_seed(seed, 1, 0) as i32);
        warp_x.set_noise_type(Some(NoiseType::OpenSimplex2));
        warp_x.set_frequency(Some(freq));
        let mut warp_z = FastNoiseLite::with_seed(mix_seed(seed, 0, 1) as i32);
        warp_z.set_noise_type(Some(NoiseType::OpenSimplex2));
        warp_z.set_frequency(Some(freq));
        Self {
            seed,
            size,
            tree,
            warp_x,
            warp_z,
            warp_amplitude: size as f32 * 0.25,
            cells: HashMap::new(),
            points: HashMap::new(),
            stats: ZoneCacheStats::default(),
        }
    }

    /// Builder for [`crate::source::SpatialZoneMap`].
    pub fn boxed(seed: u64, size: i32, tree: Arc<ZoneTree>) -> Box<dyn ZoneMap> {
        Box::new(Self::new(seed, size, tree))
    }

    /// Overrides the border warp; `0.0` gives straight cell borders.
    pub fn with_warp(mut self, amplitude: f32) -> Self {
        self.warp_amplitude = amplitude.max(0.0);
        self.points.clear();
        self
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    fn warp(&self, x: i32, z: i32) -> (f32, f32) {
        let (fx, fz) = (x as f32, z as f32);
        if self.warp_amplitude == 0.0 {
            return (fx, fz);
        }
        (
            fx + self.warp_x.get_noise_2d(fx, fz) * self.warp_amplitude,
            fz + self.warp_z.get_noise_2d(fx, fz) * self.warp_amplitude,
        )
    }

    /// Cell holding block `(x, z)` after warping.
    pub fn cell_of(&self, x: i32, z: i32) -> (i32, i32) {
        let (wx, wz) = self.warp(x, z);
        let s = self.size as f32;
        ((wx / s).floor() as i32, (wz / s).floor() as i32)
    }

    /// Zone of a whole cell: a top-level pick then a sub-variant select, both
    /// from the cell's own stream.
    pub fn cell_zone(&mut self, cx: i32, cz: i32) -> ZoneHandle {
        if let Some(h) = self.cells.get(&(cx, cz)) {
            return *h;
        }
        let mut rng = WorldRandom::for_cell(self.seed, cx, cz);
        let top = self.tree.pick(&mut rng);
        let zone = self.tree.select(top, &mut rng);
        self.cells.insert((cx, cz), zone);
        zone
    }

    /// The zone whose edge applies to `zone`: the zone itself, else its parent.
    fn edge_owner(&self, zone: ZoneHandle) -> Option<(ZoneHandle, ZoneHandle, i32)> {
        let own = self.tree.node(zone)?;
        if let (Some(edge), true) = (own.edge, own.edge_size > 0) {
            return Some((zone, edge, own.edge_size));
        }
        let parent = self.tree.node(own.parent?)?;
        match parent.edge {
            Some(edge) if parent.edge_size > 0 && edge != zone => {
                Some((own.parent?, edge, parent.edge_size))
            }
            _ => None,
        }
    }

    fn compute(&mut self, x: i32, z: i32) -> ZoneHandle {
        let (wx, wz) = self.warp(x, z);
        let s = self.size as f32;
        let (cx, cz) = ((wx / s).floor() as i32, (wz / s).floor() as i32);
        let zone = self.cell_zone(cx, cz);
        let Some((owner, edge, edge_size)) = self.edge_owner(zone) else {
            return zone;
        };
        let band = edge_size as f32;
        let lx = wx - cx as f32 * s;
        let lz = wz - cz as f32 * s;
        let mut neighbours = [None; 4];
        if lx < band {
            neighbours[0] = Some((cx - 1, cz));
        }
        if lx >= s - band {
            neighbours[1] = Some((cx + 1, cz));
        }
        if lz < band {
            neighbours[2] = Some((cx, cz - 1));
        }
        if lz >= s - band {
            neighbours[3] = Some((cx, cz + 1));
        }
        for (ncx, ncz) in neighbours.into_iter().flatten() {
            let other = self.cell_zone(ncx, ncz);
            if !self.tree.is_same(owner, other) {
                return edge;
            }
        }
        zone
    }
}

impl ZoneMap for SquareZoneMap {
    fn zone_at(&mut self, x: i32, _y: i32, z: i32) -> ZoneHandle {
        let key = (x >> 2, z >> 2);
        if let Some(h) = self.points.get(&key) {
            self.stats.hits += 1;
            return *h;
        }
        self.stats.misses += 1;
        let zone = self.compute(key.0 << 2, key.1 << 2);
        self.points.insert(key, zone);
        zone
    }

    fn clear_cache(&mut self) {
        self.points.clear();
        self.cells.clear();
        self.stats.clears += 1;
    }

    fn cache_stats(&self) -> ZoneCacheStats {
        ZoneCacheStats {
            entries: self.points.len(),
            ..self.stats
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{ZoneDef, ZoneFilter, ZoneId, ZoneRegistry};

    fn tree(defs: Vec<ZoneDef>) -> Arc<ZoneTree> {
        let mut reg = ZoneRegistry::new();
        for d in defs {
            reg.register(d).unwrap();
        }
        Arc::new(ZoneTree::rebuild(Some(&reg), &ZoneFilter::default()))
    }

    #[test]
    fn single_zone_fills_everything() {
        let t = tree(vec![ZoneDef::new("only").category("nether")]);
        let only = t.find(&ZoneId::new("only")).unwrap();
        let mut map = SquareZoneMap::new(5, 64, t);
        for (x, z) in [(0, 0), (-300, 17), (1023, -999), (64, 64)] {
            assert_eq!(map.zone_at(x, 0, z), only);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let defs = || {
            vec![
                ZoneDef::new("a").category("nether"),
                ZoneDef::new("b").category("nether"),
                ZoneDef::new("c").category("nether"),
            ]
        };
        let mut m1 = SquareZoneMap::new(99, 32, tree(defs()));
        let mut m2 = SquareZoneMap::new(99, 32, tree(defs()));
        for x in (-200..200).step_by(13) {
            for z in (-200..200).step_by(11) {
                assert_eq!(m1.zone_at(x, 0, z), m2.zone_at(x, 0, z));
            }
        }
    }

    #[test]
    fn point_cache_is_quantized() {
        let t = tree(vec![ZoneDef::new("a").category("nether")]);
        let mut map = SquareZoneMap::new(1, 64, t);
        map.zone_at(0, 0, 0);
        map.zone_at(3, 50, 2);
        map.zone_at(4, 0, 0);
        let s = map.cache_stats();
        assert_eq!((s.hits, s.misses, s.entries), (1, 2, 2));
        map.clear_cache();
        let s = map.cache_stats();
        assert_eq!((s.clears, s.entries), (1, 0));
    }

    #[test]
    fn edge_band_follows_foreign_borders() {
        let t = tree(vec![
            ZoneDef::new("a").category("nether").edge("a_edge", 4),
            ZoneDef::new("a_edge"),
            ZoneDef::new("b").category("nether"),
        ]);
        let a = t.find(&ZoneId::new("a")).unwrap();
        let edge = t.find(&ZoneId::new("a_edge")).unwrap();
        let size = 16;
        let mut map = SquareZoneMap::new(7, size, t.clone()).with_warp(0.0);
        let mut edges_seen = 0;
        for x in (0..size * 40).step_by(4) {
            let (cx, _) = map.cell_of(x, 0);
            let here = map.cell_zone(cx, 0);
            let lx = x - cx * size;
            let west = map.cell_zone(cx - 1, 0);
            let east = map.cell_zone(cx + 1, 0);
            let north = map.cell_zone(cx, -1);
            let near_foreign = (lx < 4 && !t.is_same(a, west))
                || (lx >= size - 4 && !t.is_same(a, east))
                || !t.is_same(a, north);
            let got = map.zone_at(x, 0, 0);
            if here == a && near_foreign {
                assert_eq!(got, edge, "x={x}");
                edges_seen += 1;
            } else {
                assert_eq!(got, here, "x={x}");
            }
        }
        assert!(edges_seen > 0);
    }
}
