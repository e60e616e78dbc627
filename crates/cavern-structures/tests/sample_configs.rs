use std::path::{Path, PathBuf};

use cavern_blocks::{Block, BlockRegistry};
use cavern_chunk::SparseTerrain;
use cavern_geom::BlockPos;
use cavern_structures::{CollectingObserver, ScatterFeature, load_feature_from_path};
use cavern_world::WorldRandom;

/// `configs/` at the workspace root, two levels above this crate.
fn configs() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs")
}

#[test]
fn feature_configs_compile_and_place() {
    let blocks = BlockRegistry::load_from_path(configs().join("blocks.toml")).unwrap();
    let rock = blocks.block_by_name("netherrack").unwrap();
    for name in ["basalt_pillars", "glowstone_drips"] {
        let def = load_feature_from_path(&configs().join("features").join(format!("{name}.toml"))).unwrap();
        let feature = ScatterFeature::compile(&def, &blocks).unwrap();
        assert_eq!(feature.name, name);

        let mut terrain =
            SparseTerrain::new(move |p: BlockPos| if p.y <= 40 || p.y >= 56 { rock } else { Block::AIR });
        let mut observer = CollectingObserver::default();
        let mut placed = 0;
        for cx in 0..4 {
            let mut rng = WorldRandom::for_cell(9, cx, 0);
            let report = feature.place_in_chunk(&mut terrain, cx, 0, 40, 56, &mut rng, &mut observer);
            placed += report.placed;
        }
        assert!(placed > 0, "{name} placed nothing");
        assert!(terrain.edit_count() > 0);
    }
}
