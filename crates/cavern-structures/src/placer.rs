//! Pillar scatter: a center pillar on a floor or ceiling, secondary pillars
//! jittered around it, and base-block patches under their feet.

use cavern_blocks::Block;
use cavern_chunk::TerrainStore;
use cavern_geom::{BlockPos, Direction};
use cavern_world::GenRandom;

use crate::config::ScatterConfig;
use crate::observer::{LogObserver, ScatterEvent, ScatterObserver};
use crate::surface::{find_surrounding_surface, free_run, is_free_space};

/// Cells scanned toward the surface for each secondary pillar.
pub const SURFACE_SCAN_DEPTH: i32 = 4;

/// Totals for one placement call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScatterOutcome {
    /// Growth direction; `None` when nothing could attach.
    pub direction: Option<Direction>,
    pub pillars: u32,
    pub blocks_placed: u32,
    pub base_blocks: u32,
    pub skipped_attempts: u32,
}

impl ScatterOutcome {
    pub fn succeeded(&self) -> bool {
        self.direction.is_some()
    }

    pub fn merge(&mut self, other: &ScatterOutcome) {
        self.pillars += other.pillars;
        self.blocks_placed += other.blocks_placed;
        self.base_blocks += other.base_blocks;
        self.skipped_attempts += other.skipped_attempts;
    }
}

/// Height draw for the center pillar: uniform over `[min, max]` from a
/// single float.
#[inline]
pub fn center_height(min: i32, max: i32, draw: f32) -> i32 {
    (draw * (1 + max - min) as f32 + min as f32) as i32
}

/// Falloff with horizontal distance `d` from the center; reaches 0 at
/// `max_spread * sqrt(2)`. A zero spread never falls off.
#[inline]
pub fn distance_factor(d: f64, max_spread: f32) -> f32 {
    let norm = f64::from(max_spread) * std::f64::consts::SQRT_2;
    if norm <= 0.0 {
        return 1.0;
    }
    (1.0 - d / norm) as f32
}

/// Secondary pillar height: `h` scaled toward `min` by `factor`, clamped to
/// `[min, max]`. A candidate below `min` counts as `min`, so a non-positive
/// factor always gives `min`.
#[inline]
pub fn scaled_height(min: i32, max: i32, h: i32, factor: f32) -> i32 {
    let h = h.max(min);
    let scaled = min as f64 + f64::from(factor) * (h - min) as f64;
    scaled.max(min as f64).min(max as f64) as i32
}

pub struct ScatterPlacer<'a> {
    config: &'a ScatterConfig,
}

impl<'a> ScatterPlacer<'a> {
    pub fn new(config: &'a ScatterConfig) -> Self {
        Self { config }
    }

    /// Places one feature instance at `origin`, logging diagnostics. False
    /// when neither floor nor ceiling can hold it; nothing is written then.
    pub fn place<S, R>(&self, store: &mut S, origin: BlockPos, rng: &mut R) -> bool
    where
        S: TerrainStore + ?Sized,
        R: GenRandom + ?Sized,
    {
        self.place_with_outcome(store, origin, rng, &mut LogObserver)
            .succeeded()
    }

    pub fn place_with_outcome<S, R>(
        &self,
        store: &mut S,
        origin: BlockPos,
        rng: &mut R,
        observer: &mut dyn ScatterObserver,
    ) -> ScatterOutcome
    where
        S: TerrainStore + ?Sized,
        R: GenRandom + ?Sized,
    {
        let mut out = ScatterOutcome::default();
        let Some(direction) = self.attach_direction(store, origin, rng) else {
            observer.on_event(ScatterEvent::NoAttachment { origin });
            return out;
        };
        out.direction = Some(direction);
        let base = origin.relative_by(direction, -1);
        let cfg = self.config;
        let height = center_height(cfg.min_height, cfg.max_height, rng.next_f32());
        self.grow_center(store, origin, base, direction, height, rng, observer, &mut out);
        out
    }

    /// Growth direction: up from a floor, down from a ceiling.
    fn attach_direction<S, R>(&self, store: &S, origin: BlockPos, rng: &mut R) -> Option<Direction>
    where
        S: TerrainStore + ?Sized,
        R: GenRandom + ?Sized,
    {
        let cfg = self.config;
        let on_ceiling = cfg.floor_chance < 1.0 && cfg.is_valid_base(store.block(origin.above()));
        let on_floor = cfg.floor_chance > 0.0 && cfg.is_valid_base(store.block(origin.below()));
        match (on_floor, on_ceiling) {
            (true, true) => Some(if rng.next_f32() < cfg.floor_chance {
                Direction::Up
            } else {
                Direction::Down
            }),
            (true, false) => Some(Direction::Up),
            (false, true) => Some(Direction::Down),
            (false, false) => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn grow_center<S, R>(
        &self,
        store: &mut S,
        origin: BlockPos,
        base: BlockPos,
        direction: Direction,
        center_height: i32,
        rng: &mut R,
        observer: &mut dyn ScatterObserver,
        out: &mut ScatterOutcome,
    ) where
        S: TerrainStore + ?Sized,
        R: GenRandom + ?Sized,
    {
        let cfg = self.config;
        if !cfg.is_valid_base(store.block(base)) {
            return;
        }
        let toward_surface = direction.opposite();
        self.build_with_base(store, origin, base, direction, center_height, rng, observer, out);

        let tries = cfg.spread_count.sample(rng).max(0);
        let spread = f64::from(cfg.max_spread);
        for _ in 0..tries {
            let x = origin.x.wrapping_add(rng.next_normal(0.0, spread) as i32);
            let z = origin.z.wrapping_add(rng.next_normal(0.0, spread) as i32);
            let column = BlockPos::new(x, base.y, z);
            let Some(pos) = find_surrounding_surface(
                &*store,
                column,
                toward_surface,
                SURFACE_SCAN_DEPTH,
                |b| cfg.is_valid_base(b),
            ) else {
                observer.on_event(ScatterEvent::SurfaceMissing { column });
                out.skipped_attempts += 1;
                continue;
            };
            let h = if cfg.grow_while_free {
                free_run(&*store, pos, direction, cfg.max_height, |b| cfg.is_free(b))
            } else {
                center_height
            };
            let d = pos.horizontal_distance(origin);
            let factor = distance_factor(d, cfg.max_spread) * (1.0 - rng.next_f32() * cfg.size_variation);
            let height = scaled_height(cfg.min_height, cfg.max_height, h, factor);
            let foot = pos.relative(toward_surface);
            if !self.build_with_base(store, pos, foot, direction, height, rng, observer, out) {
                out.skipped_attempts += 1;
            }
        }
    }

    /// Patch, footing check, then the pillar. False when refused.
    #[allow(clippy::too_many_arguments)]
    fn build_with_base<S, R>(
        &self,
        store: &mut S,
        origin: BlockPos,
        base: BlockPos,
        direction: Direction,
        height: i32,
        rng: &mut R,
        observer: &mut dyn ScatterObserver,
        out: &mut ScatterOutcome,
    ) -> bool
    where
        S: TerrainStore + ?Sized,
        R: GenRandom + ?Sized,
    {
        let cfg = self.config;
        if !is_free_space(&*store, origin, direction, height, |b| cfg.is_free(b)) {
            observer.on_event(ScatterEvent::PillarRefused { origin, height });
            return false;
        }
        out.base_blocks += self.base_patch(store, base, rng);
        let bottom = cfg.bottom_block.as_ref().map(|p| p.sample(rng));
        if !self.can_hold(store, origin, base) {
            observer.on_event(ScatterEvent::PillarRefused { origin, height });
            return false;
        }
        self.build_pillar(store, origin, direction, height, bottom, rng, observer, out);
        true
    }

    fn can_hold<S>(&self, store: &S, origin: BlockPos, base: BlockPos) -> bool
    where
        S: TerrainStore + ?Sized,
    {
        self.config.support.test(store.block(base)) && self.config.is_free(store.block(origin))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_pillar<S, R>(
        &self,
        store: &mut S,
        origin: BlockPos,
        direction: Direction,
        height: i32,
        bottom: Option<Block>,
        rng: &mut R,
        observer: &mut dyn ScatterObserver,
        out: &mut ScatterOutcome,
    ) where
        S: TerrainStore + ?Sized,
        R: GenRandom + ?Sized,
    {
        if height <= 0 {
            return;
        }
        let cfg = self.config;
        let mut pos = origin;
        for layer in 0..height {
            let previous = store.block(pos);
            let placed = match bottom {
                Some(b) if layer == 0 => b,
                _ => cfg.body_block.block_for(layer, height - 1, rng),
            };
            if !cfg.replaceable.test(previous) {
                observer.on_event(ScatterEvent::Replaced { pos, previous, placed });
            }
            store.set_block(pos, placed);
            out.blocks_placed += 1;
            pos = pos.relative(direction);
        }
        out.pillars += 1;
        observer.on_event(ScatterEvent::Pillar {
            origin,
            direction,
            height,
        });
    }

    /// Replaces terrain around `anchor` with the base block along short
    /// random branches; returns the number of cells replaced.
    fn base_patch<S, R>(&self, store: &mut S, anchor: BlockPos, rng: &mut R) -> u32
    where
        S: TerrainStore + ?Sized,
        R: GenRandom + ?Sized,
    {
        let cfg = self.config;
        let Some(base_block) = cfg.base_block else {
            return 0;
        };
        if cfg.base_replace_chance <= 0.0 || rng.next_f32() >= cfg.base_replace_chance {
            return 0;
        }
        let mut placed = 0;
        let mut put = |store: &mut S, pos: BlockPos| {
            if cfg.is_terrain(store.block(pos)) {
                store.set_block(pos, base_block);
                placed += 1;
            }
        };
        for dir in Direction::HORIZONTAL {
            if rng.next_f32() > cfg.chance_of_directional_spread {
                continue;
            }
            let mut pos = anchor.relative(dir);
            put(store, pos);

            if rng.next_f32() > cfg.chance_of_spread_radius2 {
                continue;
            }
            pos = pos.relative(Direction::from_index(rng.next_i32(6) as usize));
            put(store, pos);

            if rng.next_f32() > cfg.chance_of_spread_radius3 {
                continue;
            }
            pos = pos.relative(Direction::from_index(rng.next_i32(6) as usize));
            put(store, pos);
        }
        put(store, anchor);
        placed
    }
}
