//! Value and block providers referenced from feature TOML.

use std::collections::HashMap;

use cavern_blocks::{Block, BlockRegistry};
use cavern_world::GenRandom;
use serde::Deserialize;

use crate::error::ScatterConfigError;

/// Integer drawn per use. In TOML either a bare integer or a table:
///
/// ```toml
/// spread_count = 4
/// spread_count = { kind = "uniform", min = 2, max = 5 }
/// spread_count = { kind = "clamped_normal", mean = 3.0, deviation = 1.5, min = 0, max = 6 }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "IntDistributionDef")]
pub enum IntDistribution {
    Constant(i32),
    Uniform { min: i32, max: i32 },
    ClampedNormal { mean: f32, deviation: f32, min: i32, max: i32 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntDistributionDef {
    Constant(i32),
    Shaped(ShapedInt),
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ShapedInt {
    Constant { value: i32 },
    Uniform { min: i32, max: i32 },
    ClampedNormal { mean: f32, deviation: f32, min: i32, max: i32 },
}

impl From<IntDistributionDef> for IntDistribution {
    fn from(def: IntDistributionDef) -> Self {
        match def {
            IntDistributionDef::Constant(v) | IntDistributionDef::Shaped(ShapedInt::Constant { value: v }) => {
                IntDistribution::Constant(v)
            }
            IntDistributionDef::Shaped(ShapedInt::Uniform { min, max }) => IntDistribution::Uniform { min, max },
            IntDistributionDef::Shaped(ShapedInt::ClampedNormal { mean, deviation, min, max }) => {
                IntDistribution::ClampedNormal { mean, deviation, min, max }
            }
        }
    }
}

impl IntDistribution {
    pub fn sample<R: GenRandom + ?Sized>(&self, rng: &mut R) -> i32 {
        match *self {
            IntDistribution::Constant(v) => v,
            IntDistribution::Uniform { min, max } => rng.range_inclusive(min, max),
            IntDistribution::ClampedNormal { mean, deviation, min, max } => {
                let v = rng.next_normal(f64::from(mean), f64::from(deviation));
                v.clamp(f64::from(min), f64::from(max)) as i32
            }
        }
    }

    pub fn min_value(&self) -> i32 {
        match *self {
            IntDistribution::Constant(v) => v,
            IntDistribution::Uniform { min, .. } | IntDistribution::ClampedNormal { min, .. } => min,
        }
    }

    pub fn max_value(&self) -> i32 {
        match *self {
            IntDistribution::Constant(v) => v,
            IntDistribution::Uniform { max, .. } | IntDistribution::ClampedNormal { max, .. } => max,
        }
    }

    pub fn validate(&self, field: &'static str) -> Result<(), ScatterConfigError> {
        let bad_deviation = matches!(self, IntDistribution::ClampedNormal { deviation, .. } if !(*deviation >= 0.0));
        if self.min_value() > self.max_value() || bad_deviation {
            return Err(ScatterConfigError::InvalidDistribution {
                field,
                min: self.min_value(),
                max: self.max_value(),
            });
        }
        Ok(())
    }

    /// Rejects distributions that can draw above `limit`.
    pub fn validate_max(&self, field: &'static str, limit: i32) -> Result<(), ScatterConfigError> {
        if self.max_value() > limit {
            return Err(ScatterConfigError::TooLarge {
                field,
                value: self.max_value(),
                limit,
            });
        }
        Ok(())
    }
}

/// A block name, optionally with state properties.
///
/// ```toml
/// body_block = "basalt"
/// body_block = { name = "dripstone", properties = { thickness = "tip" } }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BlockRefDef {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        properties: HashMap<String, String>,
    },
}

impl BlockRefDef {
    pub fn resolve(&self, reg: &BlockRegistry) -> Result<Block, ScatterConfigError> {
        let block = match self {
            BlockRefDef::Name(name) => reg.make_block_by_name(name, None)?,
            BlockRefDef::Full { name, properties } => reg.make_block_by_name(name, Some(properties))?,
        };
        Ok(block)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WeightedBlockDef {
    pub block: BlockRefDef,
    #[serde(default = "default_block_weight")]
    pub weight: u32,
}

fn default_block_weight() -> u32 {
    1
}

/// One block or a weighted pick.
///
/// ```toml
/// bottom_block = { weighted = [{ block = "basalt", weight = 3 }, { block = "blackstone" }] }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BlockProviderDef {
    Single(BlockRefDef),
    Weighted { weighted: Vec<WeightedBlockDef> },
}

impl BlockProviderDef {
    pub fn compile(&self, reg: &BlockRegistry, field: &'static str) -> Result<BlockStateProvider, ScatterConfigError> {
        match self {
            BlockProviderDef::Single(r) => Ok(BlockStateProvider::Simple(r.resolve(reg)?)),
            BlockProviderDef::Weighted { weighted } => {
                let mut entries = Vec::with_capacity(weighted.len());
                let mut total = 0u32;
                for w in weighted.iter().filter(|w| w.weight > 0) {
                    total += w.weight;
                    entries.push((w.block.resolve(reg)?, total));
                }
                if entries.is_empty() {
                    return Err(ScatterConfigError::EmptyProvider(field));
                }
                Ok(BlockStateProvider::Weighted { entries, total })
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BlockStateProvider {
    Simple(Block),
    /// Entries carry cumulative weights.
    Weighted { entries: Vec<(Block, u32)>, total: u32 },
}

impl BlockStateProvider {
    /// `Simple` draws nothing from `rng`.
    pub fn sample<R: GenRandom + ?Sized>(&self, rng: &mut R) -> Block {
        match self {
            BlockStateProvider::Simple(b) => *b,
            BlockStateProvider::Weighted { entries, total } => {
                let r = rng.next_i32(*total as i32) as u32;
                entries
                    .iter()
                    .find(|(_, cum)| r < *cum)
                    .or(entries.last())
                    .map(|(b, _)| *b)
                    .unwrap_or(Block::AIR)
            }
        }
    }
}

/// Pillar body. A plain provider fills every layer; `tapered` lists blocks
/// from base to tip, the last going on the tip and the first filling
/// everything below the listed run.
///
/// ```toml
/// body_block = { tapered = [
///     { name = "dripstone", properties = { thickness = "base" } },
///     { name = "dripstone", properties = { thickness = "middle" } },
///     { name = "dripstone", properties = { thickness = "tip" } },
/// ] }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LayerProviderDef {
    Tapered { tapered: Vec<BlockRefDef> },
    Uniform(BlockProviderDef),
}

impl LayerProviderDef {
    pub fn compile(&self, reg: &BlockRegistry) -> Result<LayerBlockProvider, ScatterConfigError> {
        match self {
            LayerProviderDef::Uniform(p) => Ok(LayerBlockProvider::Uniform(p.compile(reg, "body_block")?)),
            LayerProviderDef::Tapered { tapered } => {
                if tapered.is_empty() {
                    return Err(ScatterConfigError::EmptyProvider("body_block"));
                }
                let blocks = tapered.iter().map(|r| r.resolve(reg)).collect::<Result<Vec<_>, _>>()?;
                Ok(LayerBlockProvider::Tapered(blocks))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayerBlockProvider {
    Uniform(BlockStateProvider),
    Tapered(Vec<Block>),
}

impl LayerBlockProvider {
    /// Block for `layer` of a pillar whose tip is layer `max_layer`.
    pub fn block_for<R: GenRandom + ?Sized>(&self, layer: i32, max_layer: i32, rng: &mut R) -> Block {
        match self {
            LayerBlockProvider::Uniform(p) => p.sample(rng),
            LayerBlockProvider::Tapered(blocks) => {
                let last = blocks.len() as i32 - 1;
                let from_tip = (max_layer - layer).clamp(0, last);
                blocks[(last - from_tip) as usize]
            }
        }
    }
}
