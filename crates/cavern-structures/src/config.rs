use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use cavern_blocks::{Block, BlockPredicate, BlockRegistry, CompiledPredicate};

use crate::error::ScatterConfigError;
use crate::provider::{
    BlockProviderDef, BlockRefDef, BlockStateProvider, IntDistribution, LayerBlockProvider, LayerProviderDef,
};

/// Tallest pillar a feature may ask for.
pub const MAX_PILLAR_HEIGHT: i32 = 512;
/// Upper bound for per-call secondary tries and per-chunk counts.
pub const MAX_SPREAD_COUNT: i32 = 256;

/// Scatter parameters as written in a feature file.
#[derive(Clone, Debug, Deserialize)]
pub struct ScatterConfigDef {
    #[serde(default = "default_min_height")]
    pub min_height: i32,
    #[serde(default = "default_max_height")]
    pub max_height: i32,
    /// Probability of growing up from the floor when floor and ceiling both qualify.
    #[serde(default = "default_floor_chance")]
    pub floor_chance: f32,
    /// Gaussian deviation of secondary pillar offsets, in blocks.
    #[serde(default = "default_max_spread")]
    pub max_spread: f32,
    #[serde(default = "default_size_variation")]
    pub size_variation: f32,
    #[serde(default)]
    pub grow_while_free: bool,
    #[serde(default = "default_spread_count")]
    pub spread_count: IntDistribution,
    #[serde(default)]
    pub base_replace_chance: f32,
    #[serde(default)]
    pub chance_of_directional_spread: f32,
    #[serde(default)]
    pub chance_of_spread_radius2: f32,
    #[serde(default)]
    pub chance_of_spread_radius3: f32,
    #[serde(default = "default_valid_base")]
    pub valid_base: BlockPredicate,
    #[serde(default = "default_free_space")]
    pub free_space: BlockPredicate,
    #[serde(default = "default_terrain")]
    pub terrain: BlockPredicate,
    /// What the pillar foot must rest on.
    #[serde(default = "default_support")]
    pub support: BlockPredicate,
    #[serde(default)]
    pub base_block: Option<BlockRefDef>,
    #[serde(default)]
    pub bottom_block: Option<BlockProviderDef>,
    pub body_block: LayerProviderDef,
}

fn default_min_height() -> i32 {
    2
}
fn default_max_height() -> i32 {
    7
}
fn default_floor_chance() -> f32 {
    0.5
}
fn default_max_spread() -> f32 {
    2.0
}
fn default_size_variation() -> f32 {
    0.8
}
fn default_spread_count() -> IntDistribution {
    IntDistribution::Constant(0)
}
fn default_valid_base() -> BlockPredicate {
    BlockPredicate::tag("terrain")
}
fn default_free_space() -> BlockPredicate {
    BlockPredicate::Free
}
fn default_terrain() -> BlockPredicate {
    BlockPredicate::tag("terrain")
}
fn default_support() -> BlockPredicate {
    BlockPredicate::Solid
}

impl ScatterConfigDef {
    /// Plain pillar of `body` with every other field at its default.
    pub fn new(body: &str) -> Self {
        Self {
            min_height: default_min_height(),
            max_height: default_max_height(),
            floor_chance: default_floor_chance(),
            max_spread: default_max_spread(),
            size_variation: default_size_variation(),
            grow_while_free: false,
            spread_count: default_spread_count(),
            base_replace_chance: 0.0,
            chance_of_directional_spread: 0.0,
            chance_of_spread_radius2: 0.0,
            chance_of_spread_radius3: 0.0,
            valid_base: default_valid_base(),
            free_space: default_free_space(),
            terrain: default_terrain(),
            support: default_support(),
            base_block: None,
            bottom_block: None,
            body_block: LayerProviderDef::Uniform(BlockProviderDef::Single(BlockRefDef::Name(body.to_string()))),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ScatterConfigError> {
        Ok(toml::from_str(s)?)
    }

    fn validate(&self) -> Result<(), ScatterConfigError> {
        if self.min_height < 0 || self.min_height > self.max_height {
            return Err(ScatterConfigError::InvalidHeightRange {
                min: self.min_height,
                max: self.max_height,
            });
        }
        for (field, value) in [
            ("floor_chance", self.floor_chance),
            ("size_variation", self.size_variation),
            ("base_replace_chance", self.base_replace_chance),
            ("chance_of_directional_spread", self.chance_of_directional_spread),
            ("chance_of_spread_radius2", self.chance_of_spread_radius2),
            ("chance_of_spread_radius3", self.chance_of_spread_radius3),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScatterConfigError::ChanceOutOfRange { field, value });
            }
        }
        if !(self.max_spread.is_finite() && self.max_spread >= 0.0) {
            return Err(ScatterConfigError::NegativeValue {
                field: "max_spread",
                value: self.max_spread,
            });
        }
        if self.max_height > MAX_PILLAR_HEIGHT {
            return Err(ScatterConfigError::TooLarge {
                field: "max_height",
                value: self.max_height,
                limit: MAX_PILLAR_HEIGHT,
            });
        }
        self.spread_count.validate("spread_count")?;
        self.spread_count.validate_max("spread_count", MAX_SPREAD_COUNT)
    }

    /// Checks ranges and resolves every block and predicate against `reg`.
    pub fn compile(&self, reg: &BlockRegistry) -> Result<ScatterConfig, ScatterConfigError> {
        self.validate()?;
        Ok(ScatterConfig {
            min_height: self.min_height,
            max_height: self.max_height,
            floor_chance: self.floor_chance,
            max_spread: self.max_spread,
            size_variation: self.size_variation,
            grow_while_free: self.grow_while_free,
            spread_count: self.spread_count,
            base_replace_chance: self.base_replace_chance,
            chance_of_directional_spread: self.chance_of_directional_spread,
            chance_of_spread_radius2: self.chance_of_spread_radius2,
            chance_of_spread_radius3: self.chance_of_spread_radius3,
            valid_base: self.valid_base.compile(reg)?,
            free_space: self.free_space.compile(reg)?,
            terrain: self.terrain.compile(reg)?,
            support: self.support.compile(reg)?,
            replaceable: BlockPredicate::Free.compile(reg)?,
            base_block: self.base_block.as_ref().map(|b| b.resolve(reg)).transpose()?,
            bottom_block: self
                .bottom_block
                .as_ref()
                .map(|b| b.compile(reg, "bottom_block"))
                .transpose()?,
            body_block: self.body_block.compile(reg)?,
        })
    }
}

/// Validated scatter parameters bound to one block registry. Immutable and
/// shared by every placement of the feature.
#[derive(Clone, Debug)]
pub struct ScatterConfig {
    pub min_height: i32,
    pub max_height: i32,
    pub floor_chance: f32,
    pub max_spread: f32,
    pub size_variation: f32,
    pub grow_while_free: bool,
    pub spread_count: IntDistribution,
    pub base_replace_chance: f32,
    pub chance_of_directional_spread: f32,
    pub chance_of_spread_radius2: f32,
    pub chance_of_spread_radius3: f32,
    pub valid_base: CompiledPredicate,
    pub free_space: CompiledPredicate,
    pub terrain: CompiledPredicate,
    pub support: CompiledPredicate,
    /// Blocks a pillar may overwrite silently; anything else is reported.
    pub replaceable: CompiledPredicate,
    pub base_block: Option<Block>,
    pub bottom_block: Option<BlockStateProvider>,
    pub body_block: LayerBlockProvider,
}

impl ScatterConfig {
    #[inline]
    pub fn is_valid_base(&self, block: Block) -> bool {
        self.valid_base.test(block)
    }

    #[inline]
    pub fn is_free(&self, block: Block) -> bool {
        self.free_space.test(block)
    }

    #[inline]
    pub fn is_terrain(&self, block: Block) -> bool {
        self.terrain.test(block)
    }
}

/// Where instances of a feature are tried inside one chunk column.
#[derive(Clone, Debug, Deserialize)]
pub struct PlacementDef {
    /// Placement clusters per chunk.
    #[serde(default = "default_count")]
    pub count: IntDistribution,
    /// Origins per cluster.
    #[serde(default = "default_cluster")]
    pub cluster: IntDistribution,
    #[serde(default = "default_spread_xz")]
    pub spread_xz: IntDistribution,
    #[serde(default = "default_spread_y")]
    pub spread_y: IntDistribution,
    /// Cells scanned toward floor or ceiling from each origin.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: i32,
    /// Distance kept from the bottom and top of the column when picking heights.
    #[serde(default = "default_height_margin")]
    pub height_margin: i32,
    #[serde(default = "default_scan_target")]
    pub scan_target: BlockPredicate,
}

fn default_count() -> IntDistribution {
    IntDistribution::Uniform { min: 2, max: 6 }
}
fn default_cluster() -> IntDistribution {
    IntDistribution::Uniform { min: 2, max: 5 }
}
fn default_spread_xz() -> IntDistribution {
    IntDistribution::ClampedNormal {
        mean: 0.0,
        deviation: 2.0,
        min: -6,
        max: 6,
    }
}
fn default_spread_y() -> IntDistribution {
    IntDistribution::ClampedNormal {
        mean: 0.0,
        deviation: 0.6,
        min: -2,
        max: 2,
    }
}
fn default_scan_depth() -> i32 {
    12
}
fn default_height_margin() -> i32 {
    4
}
fn default_scan_target() -> BlockPredicate {
    BlockPredicate::tag("terrain")
}

impl Default for PlacementDef {
    fn default() -> Self {
        Self {
            count: default_count(),
            cluster: default_cluster(),
            spread_xz: default_spread_xz(),
            spread_y: default_spread_y(),
            scan_depth: default_scan_depth(),
            height_margin: default_height_margin(),
            scan_target: default_scan_target(),
        }
    }
}

/// A `features/*.toml` file:
///
/// ```toml
/// name = "basalt_spikes"
///
/// [placement]
/// count = { kind = "uniform", min = 1, max = 3 }
///
/// [scatter]
/// min_height = 2
/// max_height = 6
/// body_block = "basalt"
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    #[serde(default)]
    pub placement: PlacementDef,
    pub scatter: ScatterConfigDef,
}

impl FeatureDef {
    pub fn from_toml_str(s: &str) -> Result<Self, ScatterConfigError> {
        Ok(toml::from_str(s)?)
    }
}

pub fn load_feature_from_path(path: &Path) -> Result<FeatureDef, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    Ok(FeatureDef::from_toml_str(&s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cavern_blocks::config::{BlockDef, BlocksConfig};

    fn registry() -> BlockRegistry {
        BlockRegistry::from_configs(BlocksConfig {
            blocks: vec![
                BlockDef::simple("air", false),
                BlockDef::simple("netherrack", true).with_tags(&["terrain"]),
                BlockDef::simple("basalt", true).with_tags(&["terrain"]),
                BlockDef::simple("blackstone", true),
            ],
            unknown_block: None,
        })
        .unwrap()
    }

    #[test]
    fn full_feature_file() {
        let def = FeatureDef::from_toml_str(
            r#"
            name = "basalt_spikes"

            [placement]
            count = { kind = "uniform", min = 1, max = 3 }
            scan_depth = 8

            [scatter]
            min_height = 2
            max_height = 6
            floor_chance = 0.25
            max_spread = 3.0
            size_variation = 0.5
            grow_while_free = true
            spread_count = { kind = "uniform", min = 4, max = 8 }
            base_replace_chance = 0.9
            chance_of_directional_spread = 0.8
            chance_of_spread_radius2 = 0.5
            chance_of_spread_radius3 = 0.25
            valid_base = { kind = "tag", tag = "terrain" }
            terrain = { kind = "blocks", names = ["netherrack"] }
            base_block = "blackstone"
            bottom_block = { weighted = [{ block = "basalt", weight = 3 }, { block = "blackstone" }] }
            body_block = "basalt"
        "#,
        )
        .unwrap();
        assert_eq!(def.name, "basalt_spikes");
        assert_eq!(def.placement.scan_depth, 8);
        assert_eq!(def.placement.cluster, default_cluster());
        let reg = registry();
        let cfg = def.scatter.compile(&reg).unwrap();
        assert_eq!((cfg.min_height, cfg.max_height), (2, 6));
        assert!(cfg.grow_while_free);
        assert_eq!(cfg.base_block, Some(reg.block_by_name("blackstone").unwrap()));
        assert!(cfg.is_terrain(reg.block_by_name("netherrack").unwrap()));
        assert!(!cfg.is_terrain(reg.block_by_name("basalt").unwrap()));
        assert!(cfg.is_valid_base(reg.block_by_name("basalt").unwrap()));
        assert!(cfg.is_free(Block::AIR));
        assert!(matches!(cfg.bottom_block, Some(BlockStateProvider::Weighted { total: 4, .. })));
    }

    #[test]
    fn inverted_height_range_is_rejected() {
        let mut def = ScatterConfigDef::new("basalt");
        def.min_height = 5;
        def.max_height = 4;
        assert!(matches!(
            def.compile(&registry()),
            Err(ScatterConfigError::InvalidHeightRange { min: 5, max: 4 })
        ));
    }

    #[test]
    fn chances_outside_unit_range_are_rejected() {
        let mut def = ScatterConfigDef::new("basalt");
        def.chance_of_spread_radius3 = 1.5;
        assert!(matches!(
            def.compile(&registry()),
            Err(ScatterConfigError::ChanceOutOfRange {
                field: "chance_of_spread_radius3",
                ..
            })
        ));
        let mut def = ScatterConfigDef::new("basalt");
        def.max_spread = -1.0;
        assert!(matches!(
            def.compile(&registry()),
            Err(ScatterConfigError::NegativeValue { field: "max_spread", .. })
        ));
    }

    #[test]
    fn unbounded_sizes_are_rejected() {
        let mut def = ScatterConfigDef::new("basalt");
        def.min_height = 0;
        def.max_height = i32::MAX;
        assert!(matches!(
            def.compile(&registry()),
            Err(ScatterConfigError::TooLarge { field: "max_height", .. })
        ));
        def.max_height = MAX_PILLAR_HEIGHT;
        assert!(def.compile(&registry()).is_ok());

        def.spread_count = IntDistribution::Uniform { min: 0, max: i32::MAX };
        assert!(matches!(
            def.compile(&registry()),
            Err(ScatterConfigError::TooLarge { field: "spread_count", .. })
        ));
        def.spread_count = IntDistribution::Constant(MAX_SPREAD_COUNT);
        assert!(def.compile(&registry()).is_ok());
    }

    #[test]
    fn unknown_body_block_is_rejected() {
        let def = ScatterConfigDef::new("obsidian");
        assert!(matches!(def.compile(&registry()), Err(ScatterConfigError::Block(_))));
    }
}
