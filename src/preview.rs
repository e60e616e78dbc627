//! Terminal previews for the `zones` and `scatter` commands.

use std::error::Error;
use std::path::PathBuf;

use cavern_blocks::{Block, BlockRegistry};
use cavern_chunk::{SparseTerrain, TerrainStore};
use cavern_geom::{BlockPos, Direction};
use cavern_structures::feature::CHUNK_SIZE;
use cavern_structures::{
    CollectingObserver, FeatureReport, ScatterEvent, ScatterFeature, load_feature_from_path,
};
use cavern_world::{
    SpatialZoneMap, WorldRandom, ZoneId, ZoneRegistry, ZoneSourceConfig, load_zone_source_from_path,
};
use hashbrown::HashMap;

const GLYPHS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub struct ZonePreview {
    pub zones: PathBuf,
    pub source: PathBuf,
    pub seed: u64,
    pub height: i32,
    /// Block coordinates.
    pub center: (i32, i32, i32),
    /// Quarts.
    pub radius: i32,
    pub draw_map: bool,
}

pub struct ScatterPreview {
    pub blocks: PathBuf,
    pub feature: PathBuf,
    pub seed: u64,
    pub rock: String,
    pub floor: i32,
    pub ceiling: i32,
    pub chunks: i32,
    pub slice_z: Option<i32>,
}

pub fn run_zones(p: &ZonePreview) -> Result<(), Box<dyn Error>> {
    let registry = ZoneRegistry::load_from_path(&p.zones)?;
    let config = if p.source.exists() {
        load_zone_source_from_path(&p.source)?
    } else {
        log::warn!(
            target: "zones",
            "{} not found; using default zone map layout",
            p.source.display()
        );
        ZoneSourceConfig::default()
    };
    let mut map = SpatialZoneMap::new(config, Some(&registry));
    map.set_max_height(p.height);
    map.init_map(p.seed);
    log::info!(
        target: "zones",
        "{} zones registered, {} in tree, vertical bands: {}",
        registry.len(),
        map.tree().len(),
        map.uses_vertical_stack()
    );

    let (bx, by, bz) = p.center;
    let (qx, qy, qz) = (bx >> 2, by >> 2, bz >> 2);
    let r = p.radius.max(0);
    let mut rows: Vec<Vec<ZoneId>> = Vec::with_capacity((2 * r + 1) as usize);
    let mut counts: HashMap<ZoneId, usize> = HashMap::new();
    for z in qz - r..=qz + r {
        let mut row = Vec::with_capacity((2 * r + 1) as usize);
        for x in qx - r..=qx + r {
            let id = map.zone_id_at(x, qy, z);
            *counts.entry(id.clone()).or_insert(0) += 1;
            row.push(id);
        }
        rows.push(row);
    }

    let mut ranked: Vec<(ZoneId, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    let total: usize = ranked.iter().map(|(_, n)| *n).sum();
    let mut glyph_of: HashMap<ZoneId, char> = HashMap::new();
    let mut next = 0usize;
    println!("zones at y={} around ({}, {}), {} samples:", by, bx, bz, total);
    for (id, n) in &ranked {
        let glyph = if id.is_empty_sentinel() {
            '.'
        } else {
            let g = GLYPHS.get(next).map(|b| *b as char).unwrap_or('?');
            next += 1;
            g
        };
        glyph_of.insert(id.clone(), glyph);
        println!(
            "  {} {:<32} {:>6} {:>6.2}%",
            glyph,
            id.as_str(),
            n,
            100.0 * *n as f64 / total.max(1) as f64
        );
    }

    if p.draw_map {
        println!();
        for row in &rows {
            let line: String = row
                .iter()
                .map(|id| glyph_of.get(id).copied().unwrap_or('?'))
                .collect();
            println!("{}", line);
        }
    }

    let stats = map.cache_stats();
    println!(
        "\ncache: {} hits, {} misses, {} clears ({:.1}% hit rate)",
        stats.hits,
        stats.misses,
        stats.clears,
        stats.hit_rate() * 100.0
    );
    Ok(())
}

pub fn run_scatter(p: &ScatterPreview) -> Result<(), Box<dyn Error>> {
    if p.ceiling <= p.floor + 1 {
        return Err(format!("ceiling {} leaves no room above floor {}", p.ceiling, p.floor).into());
    }
    let registry = BlockRegistry::load_from_path(&p.blocks)?;
    let def = load_feature_from_path(&p.feature)?;
    let feature = ScatterFeature::compile(&def, &registry)?;
    let rock = registry.block_by_name(&p.rock)?;
    let (floor, ceiling) = (p.floor, p.ceiling);
    let mut terrain = SparseTerrain::new(move |pos: BlockPos| {
        if pos.y <= floor || pos.y >= ceiling {
            rock
        } else {
            Block::AIR
        }
    });

    let mut observer = CollectingObserver::default();
    let mut sum = FeatureReport::default();
    let n = p.chunks.max(0);
    for cz in -n..=n {
        for cx in -n..=n {
            let mut rng = WorldRandom::for_cell(p.seed, cx, cz);
            let report =
                feature.place_in_chunk(&mut terrain, cx, cz, floor, ceiling, &mut rng, &mut observer);
            println!(
                "chunk ({:>3}, {:>3}): {:>3} origins {:>3} surfaces {:>3} placed {:>4} blocks",
                cx, cz, report.origins, report.surfaces_found, report.placed, report.totals.blocks_placed
            );
            sum.origins += report.origins;
            sum.surfaces_found += report.surfaces_found;
            sum.placed += report.placed;
            sum.totals.merge(&report.totals);
        }
    }

    println!(
        "\n{}: {} origins, {} placed, {} pillars, {} blocks, {} base blocks, {} skipped",
        feature.name,
        sum.origins,
        sum.placed,
        sum.totals.pillars,
        sum.totals.blocks_placed,
        sum.totals.base_blocks,
        sum.totals.skipped_attempts
    );
    let (up, down) = observer
        .pillars()
        .fold((0, 0), |(u, d), (_, dir, _)| match dir {
            Direction::Up => (u + 1, d),
            _ => (u, d + 1),
        });
    println!("pillars from floor: {}, from ceiling: {}", up, down);
    let refused = observer
        .events
        .iter()
        .filter(|e| matches!(e, ScatterEvent::PillarRefused { .. }))
        .count();
    println!("refused: {}, replaced non-free: {}", refused, observer.replaced().count());

    let mut by_block: HashMap<&str, usize> = HashMap::new();
    for (_, b) in terrain.snapshot_all() {
        *by_block.entry(registry.name_of(b)).or_insert(0) += 1;
    }
    let mut by_block: Vec<_> = by_block.into_iter().collect();
    by_block.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (name, count) in by_block {
        println!("  {:<24} {:>6}", name, count);
    }

    if let Some(z) = p.slice_z {
        println!();
        let x0 = -n * CHUNK_SIZE;
        let x1 = (n + 1) * CHUNK_SIZE;
        for y in (floor - 1..=ceiling + 1).rev() {
            let line: String = (x0..x1)
                .map(|x| {
                    let b = terrain.block(BlockPos::new(x, y, z));
                    if b == Block::AIR {
                        ' '
                    } else if b == rock {
                        '#'
                    } else {
                        registry.name_of(b).chars().next().unwrap_or('?')
                    }
                })
                .collect();
            println!("{:>4} |{}|", y, line);
        }
    }
    Ok(())
}
