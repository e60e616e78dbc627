use std::sync::Arc;

use serde::Deserialize;

use super::error::BlockConfigError;
use super::registry::BlockRegistry;
use super::types::Block;

/// Declarative block test, as written in feature TOML.
///
/// ```toml
/// valid_base = { kind = "tag", tag = "base_stone" }
/// free_space = { kind = "free" }
/// terrain = { kind = "any_of", predicates = [{ kind = "tag", tag = "terrain" }, { kind = "blocks", names = ["gravel"] }] }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockPredicate {
    Any,
    Free,
    Solid,
    Blocks { names: Vec<String> },
    Tag { tag: String },
    Not { predicate: Box<BlockPredicate> },
    AnyOf { predicates: Vec<BlockPredicate> },
    AllOf { predicates: Vec<BlockPredicate> },
}

impl BlockPredicate {
    pub fn tag(tag: &str) -> Self {
        BlockPredicate::Tag {
            tag: tag.to_string(),
        }
    }

    pub fn blocks(names: &[&str]) -> Self {
        BlockPredicate::Blocks {
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Flattens the predicate into a per-id mask. Block states are not
    /// consulted; every state of a matching id matches.
    pub fn compile(&self, reg: &BlockRegistry) -> Result<CompiledPredicate, BlockConfigError> {
        let mask = self.mask(reg)?;
        Ok(CompiledPredicate { mask: mask.into() })
    }

    fn mask(&self, reg: &BlockRegistry) -> Result<Vec<bool>, BlockConfigError> {
        let n = reg.len();
        let mask = match self {
            BlockPredicate::Any => (0..n).map(|i| reg.get(i as u16).is_some()).collect(),
            BlockPredicate::Free => (0..n)
                .map(|i| reg.is_free(Block::new(i as u16)))
                .collect(),
            BlockPredicate::Solid => (0..n)
                .map(|i| reg.is_solid(Block::new(i as u16)))
                .collect(),
            BlockPredicate::Blocks { names } => {
                let mut m = vec![false; n];
                for name in names {
                    let id = reg
                        .id_by_name(name)
                        .ok_or_else(|| BlockConfigError::UnknownBlock(name.clone()))?;
                    m[id as usize] = true;
                }
                m
            }
            BlockPredicate::Tag { tag } => {
                let ids = reg.ids_with_tag(tag);
                if ids.is_empty() {
                    log::warn!(target: "blocks", "tag `{}` matches no blocks", tag);
                }
                let mut m = vec![false; n];
                for &id in ids {
                    m[id as usize] = true;
                }
                m
            }
            BlockPredicate::Not { predicate } => {
                let inner = predicate.mask(reg)?;
                inner
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| !v && reg.get(i as u16).is_some())
                    .collect()
            }
            BlockPredicate::AnyOf { predicates } => {
                let mut m = vec![false; n];
                for p in predicates {
                    for (acc, v) in m.iter_mut().zip(p.mask(reg)?) {
                        *acc |= v;
                    }
                }
                m
            }
            BlockPredicate::AllOf { predicates } => {
                let mut m: Vec<bool> = (0..n).map(|i| reg.get(i as u16).is_some()).collect();
                for p in predicates {
                    for (acc, v) in m.iter_mut().zip(p.mask(reg)?) {
                        *acc &= v;
                    }
                }
                m
            }
        };
        Ok(mask)
    }
}

/// A predicate resolved against one registry. Ids outside the registry never
/// match.
#[derive(Clone, Debug)]
pub struct CompiledPredicate {
    mask: Arc<[bool]>,
}

impl CompiledPredicate {
    pub fn always() -> Self {
        Self {
            mask: Arc::from(vec![true; usize::from(u16::MAX) + 1]),
        }
    }

    #[inline]
    pub fn test(&self, block: Block) -> bool {
        self.mask.get(block.id as usize).copied().unwrap_or(false)
    }

    pub fn matching_count(&self) -> usize {
        self.mask.iter().filter(|v| **v).count()
    }
}
