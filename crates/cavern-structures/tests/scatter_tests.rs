use cavern_blocks::config::{BlockDef, BlocksConfig};
use cavern_blocks::{Block, BlockPredicate, BlockRegistry};
use cavern_chunk::{ChunkBuf, SparseTerrain, TerrainStore};
use cavern_geom::{BlockPos, Direction};
use cavern_structures::provider::{BlockRefDef, LayerProviderDef};
use cavern_structures::{
    CollectingObserver, FeatureDef, IntDistribution, ScatterConfig, ScatterConfigDef, ScatterEvent, ScatterFeature,
    ScatterPlacer,
};
use cavern_world::WorldRandom;

fn registry() -> BlockRegistry {
    BlockRegistry::from_configs(BlocksConfig {
        blocks: vec![
            BlockDef::simple("air", false),
            BlockDef::simple("netherrack", true).with_tags(&["terrain"]),
            BlockDef::simple("basalt", true),
            BlockDef::simple("blackstone", true),
            BlockDef::simple("vine", false),
        ],
        unknown_block: None,
    })
    .unwrap()
}

fn block(reg: &BlockRegistry, name: &str) -> Block {
    reg.block_by_name(name).unwrap()
}

/// Netherrack at and below `floor`, at and above `ceiling`, air between.
fn cave(reg: &BlockRegistry, floor: i32, ceiling: i32) -> SparseTerrain<impl Fn(BlockPos) -> Block> {
    let rock = block(reg, "netherrack");
    SparseTerrain::new(move |p: BlockPos| if p.y <= floor || p.y >= ceiling { rock } else { Block::AIR })
}

fn pillar_def(min: i32, max: i32, floor_chance: f32) -> ScatterConfigDef {
    let mut def = ScatterConfigDef::new("basalt");
    def.min_height = min;
    def.max_height = max;
    def.floor_chance = floor_chance;
    def
}

fn compile(def: &ScatterConfigDef, reg: &BlockRegistry) -> ScatterConfig {
    def.compile(reg).unwrap()
}

#[test]
fn single_floor_pillar() {
    let reg = registry();
    let cfg = compile(&pillar_def(3, 3, 1.0), &reg);
    let mut terrain = cave(&reg, 0, 100);
    let mut obs = CollectingObserver::default();
    let out = ScatterPlacer::new(&cfg).place_with_outcome(
        &mut terrain,
        BlockPos::new(0, 1, 0),
        &mut WorldRandom::new(1),
        &mut obs,
    );
    assert_eq!(out.direction, Some(Direction::Up));
    assert_eq!((out.pillars, out.blocks_placed, out.base_blocks), (1, 3, 0));
    let basalt = block(&reg, "basalt");
    assert_eq!(
        terrain.snapshot_all(),
        vec![
            (BlockPos::new(0, 1, 0), basalt),
            (BlockPos::new(0, 2, 0), basalt),
            (BlockPos::new(0, 3, 0), basalt),
        ]
    );
    assert_eq!(
        obs.pillars().collect::<Vec<_>>(),
        vec![(BlockPos::new(0, 1, 0), Direction::Up, 3)]
    );
}

#[test]
fn ceiling_pillar_grows_down() {
    let reg = registry();
    let cfg = compile(&pillar_def(2, 2, 0.0), &reg);
    let mut terrain = cave(&reg, -100, 10);
    assert!(ScatterPlacer::new(&cfg).place(&mut terrain, BlockPos::new(4, 9, 4), &mut WorldRandom::new(2)));
    let basalt = block(&reg, "basalt");
    assert_eq!(terrain.block(BlockPos::new(4, 9, 4)), basalt);
    assert_eq!(terrain.block(BlockPos::new(4, 8, 4)), basalt);
    assert_eq!(terrain.block(BlockPos::new(4, 7, 4)), Block::AIR);
}

#[test]
fn floor_only_feature_ignores_ceiling() {
    let reg = registry();
    let cfg = compile(&pillar_def(2, 2, 1.0), &reg);
    let mut terrain = cave(&reg, -100, 10);
    let mut obs = CollectingObserver::default();
    let out = ScatterPlacer::new(&cfg).place_with_outcome(
        &mut terrain,
        BlockPos::new(0, 9, 0),
        &mut WorldRandom::new(3),
        &mut obs,
    );
    assert!(!out.succeeded());
    assert_eq!(terrain.edit_count(), 0);
    assert_eq!(
        obs.events,
        vec![ScatterEvent::NoAttachment {
            origin: BlockPos::new(0, 9, 0)
        }]
    );
}

#[test]
fn mid_air_origin_fails_without_writes() {
    let reg = registry();
    let cfg = compile(&pillar_def(2, 5, 0.5), &reg);
    let mut terrain = cave(&reg, 0, 50);
    assert!(!ScatterPlacer::new(&cfg).place(&mut terrain, BlockPos::new(0, 20, 0), &mut WorldRandom::new(4)));
    assert_eq!(terrain.edit_count(), 0);
}

#[test]
fn floor_chance_splits_between_floor_and_ceiling() {
    let reg = registry();
    let cfg = compile(&pillar_def(1, 1, 0.5), &reg);
    let (mut up, mut down) = (0, 0);
    for seed in 0..200 {
        let mut terrain = cave(&reg, 0, 2);
        let out = ScatterPlacer::new(&cfg).place_with_outcome(
            &mut terrain,
            BlockPos::new(0, 1, 0),
            &mut WorldRandom::new(seed),
            &mut CollectingObserver::default(),
        );
        match out.direction {
            Some(Direction::Up) => up += 1,
            Some(Direction::Down) => down += 1,
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(out.pillars, 1);
    }
    assert!(up > 50 && down > 50, "up={up} down={down}");
}

#[test]
fn degenerate_range_gives_uniform_heights() {
    let reg = registry();
    let mut def = pillar_def(4, 4, 1.0);
    def.spread_count = IntDistribution::Constant(24);
    def.max_spread = 3.0;
    def.size_variation = 1.0;
    let cfg = compile(&def, &reg);
    for seed in 0..10 {
        let mut terrain = cave(&reg, 0, 100);
        let mut obs = CollectingObserver::default();
        let out = ScatterPlacer::new(&cfg).place_with_outcome(
            &mut terrain,
            BlockPos::new(0, 1, 0),
            &mut WorldRandom::new(seed),
            &mut obs,
        );
        assert!(out.pillars >= 1);
        assert!(obs.pillars().all(|(_, dir, h)| dir == Direction::Up && h == 4));
        assert_eq!(out.blocks_placed, out.pillars * 4);
    }
}

#[test]
fn secondary_pillars_stay_on_the_floor() {
    let reg = registry();
    let mut def = pillar_def(2, 6, 1.0);
    def.spread_count = IntDistribution::Uniform { min: 8, max: 12 };
    def.grow_while_free = true;
    let cfg = compile(&def, &reg);
    let mut terrain = cave(&reg, 0, 100);
    let mut obs = CollectingObserver::default();
    let out = ScatterPlacer::new(&cfg).place_with_outcome(
        &mut terrain,
        BlockPos::new(0, 1, 0),
        &mut WorldRandom::new(77),
        &mut obs,
    );
    for (origin, dir, h) in obs.pillars() {
        assert_eq!(origin.y, 1);
        assert_eq!(dir, Direction::Up);
        assert!((2..=6).contains(&h));
    }
    assert!(out.pillars >= 2);
}

#[test]
fn base_patch_covers_anchor_and_neighbours() {
    let reg = registry();
    let mut def = pillar_def(2, 2, 1.0);
    def.base_block = Some(BlockRefDef::Name("blackstone".into()));
    def.base_replace_chance = 1.0;
    def.chance_of_directional_spread = 1.0;
    def.chance_of_spread_radius2 = 1.0;
    def.chance_of_spread_radius3 = 1.0;
    let cfg = compile(&def, &reg);
    let mut terrain = cave(&reg, 0, 100);
    let out = ScatterPlacer::new(&cfg).place_with_outcome(
        &mut terrain,
        BlockPos::new(0, 1, 0),
        &mut WorldRandom::new(9),
        &mut CollectingObserver::default(),
    );
    let blackstone = block(&reg, "blackstone");
    let anchor = BlockPos::new(0, 0, 0);
    assert_eq!(terrain.block(anchor), blackstone);
    for dir in Direction::HORIZONTAL {
        assert_eq!(terrain.block(anchor.relative(dir)), blackstone);
    }
    assert!(out.base_blocks >= 5);
    assert_eq!(out.pillars, 1);
}

#[test]
fn base_patch_only_replaces_terrain() {
    let reg = registry();
    let mut def = pillar_def(1, 1, 1.0);
    def.base_block = Some(BlockRefDef::Name("blackstone".into()));
    def.base_replace_chance = 1.0;
    def.chance_of_directional_spread = 1.0;
    def.terrain = BlockPredicate::blocks(&["basalt"]);
    let cfg = compile(&def, &reg);
    let mut terrain = cave(&reg, 0, 100);
    let out = ScatterPlacer::new(&cfg).place_with_outcome(
        &mut terrain,
        BlockPos::new(0, 1, 0),
        &mut WorldRandom::new(10),
        &mut CollectingObserver::default(),
    );
    assert_eq!(out.base_blocks, 0);
    assert_eq!(terrain.block(BlockPos::ZERO), block(&reg, "netherrack"));
}

#[test]
fn overwriting_non_replaceable_is_reported() {
    let reg = registry();
    let mut def = pillar_def(3, 3, 1.0);
    def.free_space = BlockPredicate::AnyOf {
        predicates: vec![BlockPredicate::Free, BlockPredicate::blocks(&["vine"])],
    };
    let cfg = compile(&def, &reg);
    let vine = block(&reg, "vine");
    let mut terrain = cave(&reg, 0, 100);
    terrain.set_block(BlockPos::new(0, 2, 0), vine);
    let mut obs = CollectingObserver::default();
    let out = ScatterPlacer::new(&cfg).place_with_outcome(
        &mut terrain,
        BlockPos::new(0, 1, 0),
        &mut WorldRandom::new(11),
        &mut obs,
    );
    assert_eq!(out.pillars, 1);
    let replaced: Vec<_> = obs.replaced().cloned().collect();
    assert_eq!(
        replaced,
        vec![ScatterEvent::Replaced {
            pos: BlockPos::new(0, 2, 0),
            previous: vine,
            placed: block(&reg, "basalt"),
        }]
    );
}

#[test]
fn blocked_column_refuses_center() {
    let reg = registry();
    let cfg = compile(&pillar_def(3, 3, 1.0), &reg);
    let mut terrain = cave(&reg, 0, 100);
    terrain.set_block(BlockPos::new(0, 3, 0), block(&reg, "blackstone"));
    let mut obs = CollectingObserver::default();
    let out = ScatterPlacer::new(&cfg).place_with_outcome(
        &mut terrain,
        BlockPos::new(0, 1, 0),
        &mut WorldRandom::new(12),
        &mut obs,
    );
    // attached, so the call succeeds even though nothing grew
    assert!(out.succeeded());
    assert_eq!(out.pillars, 0);
    assert_eq!(terrain.edit_count(), 1);
    assert!(matches!(obs.events[0], ScatterEvent::PillarRefused { height: 3, .. }));
}

#[test]
fn bottom_and_tapered_layers() {
    let reg = registry();
    let mut def = pillar_def(4, 4, 1.0);
    def.bottom_block = Some(cavern_structures::provider::BlockProviderDef::Single(BlockRefDef::Name(
        "netherrack".into(),
    )));
    def.body_block = LayerProviderDef::Tapered {
        tapered: vec![BlockRefDef::Name("basalt".into()), BlockRefDef::Name("blackstone".into())],
    };
    let cfg = compile(&def, &reg);
    let mut terrain = cave(&reg, 0, 100);
    assert!(ScatterPlacer::new(&cfg).place(&mut terrain, BlockPos::new(0, 1, 0), &mut WorldRandom::new(13)));
    let column: Vec<Block> = (1..=4).map(|y| terrain.block(BlockPos::new(0, y, 0))).collect();
    assert_eq!(
        column,
        vec![
            block(&reg, "netherrack"),
            block(&reg, "basalt"),
            block(&reg, "basalt"),
            block(&reg, "blackstone"),
        ]
    );
}

#[test]
fn same_seed_same_result() {
    let reg = registry();
    let mut def = pillar_def(2, 7, 0.5);
    def.spread_count = IntDistribution::Uniform { min: 3, max: 9 };
    def.grow_while_free = true;
    def.base_block = Some(BlockRefDef::Name("blackstone".into()));
    def.base_replace_chance = 0.8;
    def.chance_of_directional_spread = 0.7;
    def.chance_of_spread_radius2 = 0.5;
    def.chance_of_spread_radius3 = 0.3;
    let cfg = compile(&def, &reg);
    let run = |seed: u64| {
        let mut terrain = cave(&reg, 0, 12);
        ScatterPlacer::new(&cfg).place(&mut terrain, BlockPos::new(0, 1, 0), &mut WorldRandom::new(seed));
        terrain.snapshot_all()
    };
    assert_eq!(run(5), run(5));
    assert_eq!(run(6), run(6));
}

#[test]
fn chunk_buffer_drops_writes_outside() {
    let reg = registry();
    let rock = block(&reg, "netherrack");
    let mut buf = ChunkBuf::filled(BlockPos::new(0, 0, 0), 4, 8, 4, Block::AIR).with_outside(rock);
    buf.fill_box(BlockPos::new(0, 0, 0), BlockPos::new(3, 0, 3), rock);
    let cfg = compile(&pillar_def(12, 12, 1.0), &reg);
    // the column leaves the buffer at y=8, and reads above it are rock
    assert!(ScatterPlacer::new(&cfg).place(&mut buf, BlockPos::new(1, 1, 1), &mut WorldRandom::new(14)));
    assert_eq!(buf.count(block(&reg, "basalt")), 0);
    assert_eq!(buf.dropped_writes, 0);
}

#[test]
fn feature_runs_over_a_chunk() {
    let reg = registry();
    let def = FeatureDef::from_toml_str(
        r#"
        name = "basalt_columns"

        [placement]
        count = 3
        cluster = 2
        spread_y = 0
        scan_depth = 32
        height_margin = 0

        [scatter]
        min_height = 1
        max_height = 3
        floor_chance = 1.0
        body_block = "basalt"
    "#,
    )
    .unwrap();
    let feature = ScatterFeature::compile(&def, &reg).unwrap();
    let mut terrain = cave(&reg, 0, 20);
    let mut obs = CollectingObserver::default();
    let report = feature.place_in_chunk(&mut terrain, 2, -1, 1, 19, &mut WorldRandom::new(15), &mut obs);
    assert_eq!(report.origins, 6);
    // an origin landing inside an earlier pillar finds no open floor
    assert!(report.surfaces_found >= 1);
    assert_eq!(report.placed, report.surfaces_found);
    assert!(report.totals.pillars >= 1);
    for (origin, dir, _) in obs.pillars() {
        assert_eq!(origin.y, 1);
        assert_eq!(dir, Direction::Up);
    }
}

#[test]
fn runaway_placement_counts_are_rejected() {
    let reg = registry();
    let def = FeatureDef::from_toml_str(
        r#"
        name = "endless"

        [placement]
        count = { kind = "uniform", min = 1, max = 100000 }

        [scatter]
        body_block = "basalt"
    "#,
    )
    .unwrap();
    assert!(matches!(
        ScatterFeature::compile(&def, &reg),
        Err(cavern_structures::ScatterConfigError::TooLarge { field: "placement.count", .. })
    ));
}
