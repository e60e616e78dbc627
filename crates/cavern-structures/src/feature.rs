//! Per-chunk driver: picks origins the way cave decorations are spread and
//! hands each one to the placer.

use cavern_blocks::{BlockRegistry, CompiledPredicate};
use cavern_chunk::TerrainStore;
use cavern_geom::{BlockPos, Direction};
use cavern_world::GenRandom;

use crate::config::{FeatureDef, MAX_SPREAD_COUNT, ScatterConfig};
use crate::error::ScatterConfigError;
use crate::observer::ScatterObserver;
use crate::placer::{ScatterOutcome, ScatterPlacer};
use crate::provider::IntDistribution;
use crate::surface::scan_for;

pub const CHUNK_SIZE: i32 = 16;

#[derive(Clone, Debug)]
pub struct FeaturePlacement {
    pub count: IntDistribution,
    pub cluster: IntDistribution,
    pub spread_xz: IntDistribution,
    pub spread_y: IntDistribution,
    pub scan_depth: i32,
    pub height_margin: i32,
    pub scan_target: CompiledPredicate,
}

#[derive(Clone, Debug)]
pub struct ScatterFeature {
    pub name: String,
    pub placement: FeaturePlacement,
    pub config: ScatterConfig,
}

/// Result of one chunk pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureReport {
    pub origins: u32,
    pub surfaces_found: u32,
    pub placed: u32,
    pub totals: ScatterOutcome,
}

impl ScatterFeature {
    pub fn compile(def: &FeatureDef, reg: &BlockRegistry) -> Result<Self, ScatterConfigError> {
        let p = &def.placement;
        p.count.validate("placement.count")?;
        p.count.validate_max("placement.count", MAX_SPREAD_COUNT)?;
        p.cluster.validate("placement.cluster")?;
        p.cluster.validate_max("placement.cluster", MAX_SPREAD_COUNT)?;
        p.spread_xz.validate("placement.spread_xz")?;
        p.spread_y.validate("placement.spread_y")?;
        if p.scan_depth < 0 {
            return Err(ScatterConfigError::NegativeValue {
                field: "placement.scan_depth",
                value: p.scan_depth as f32,
            });
        }
        Ok(Self {
            name: def.name.clone(),
            placement: FeaturePlacement {
                count: p.count,
                cluster: p.cluster,
                spread_xz: p.spread_xz,
                spread_y: p.spread_y,
                scan_depth: p.scan_depth,
                height_margin: p.height_margin.max(0),
                scan_target: p.scan_target.compile(reg)?,
            },
            config: def.scatter.compile(reg)?,
        })
    }

    /// Scan directions this feature can use: down to floors, up to ceilings.
    fn scan_directions(&self) -> &'static [Direction] {
        let f = self.config.floor_chance;
        if f >= 1.0 {
            &[Direction::Down]
        } else if f <= 0.0 {
            &[Direction::Up]
        } else {
            &[Direction::Down, Direction::Up]
        }
    }

    /// Runs the feature over chunk `(chunk_x, chunk_z)` between `min_y` and
    /// `max_y` inclusive.
    #[allow(clippy::too_many_arguments)]
    pub fn place_in_chunk<S, R>(
        &self,
        store: &mut S,
        chunk_x: i32,
        chunk_z: i32,
        min_y: i32,
        max_y: i32,
        rng: &mut R,
        observer: &mut dyn ScatterObserver,
    ) -> FeatureReport
    where
        S: TerrainStore + ?Sized,
        R: GenRandom + ?Sized,
    {
        let p = &self.placement;
        let placer = ScatterPlacer::new(&self.config);
        let mut report = FeatureReport::default();
        let (lo, hi) = if max_y - min_y > 2 * p.height_margin {
            (min_y + p.height_margin, max_y - p.height_margin)
        } else {
            (min_y, max_y)
        };
        let dirs = self.scan_directions();

        for _ in 0..p.count.sample(rng).max(0) {
            let x = chunk_x * CHUNK_SIZE + rng.next_i32(CHUNK_SIZE);
            let z = chunk_z * CHUNK_SIZE + rng.next_i32(CHUNK_SIZE);
            let y = rng.range_inclusive(lo, hi);
            for _ in 0..p.cluster.sample(rng).max(0) {
                let start = BlockPos::new(
                    x + p.spread_xz.sample(rng),
                    y + p.spread_y.sample(rng),
                    z + p.spread_xz.sample(rng),
                );
                report.origins += 1;
                let dir = dirs[rng.next_i32(dirs.len() as i32) as usize];
                let Some(surface) = scan_for(
                    &*store,
                    start,
                    dir,
                    p.scan_depth,
                    |b| p.scan_target.test(b),
                    |b| self.config.is_free(b),
                ) else {
                    continue;
                };
                report.surfaces_found += 1;
                let origin = surface.relative(dir.opposite());
                let outcome = placer.place_with_outcome(store, origin, rng, observer);
                if outcome.succeeded() {
                    report.placed += 1;
                }
                report.totals.merge(&outcome);
            }
        }
        log::debug!(
            target: "scatter",
            "{} in chunk ({}, {}): {} origins, {} placed, {} pillars",
            self.name,
            chunk_x,
            chunk_z,
            report.origins,
            report.placed,
            report.totals.pillars
        );
        report
    }
}
