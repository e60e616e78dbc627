use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::{BlockDef, BlocksConfig};
use super::error::BlockConfigError;
use super::types::{Block, BlockId, BlockState};

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    pub by_tag: HashMap<String, Vec<BlockId>>,
    pub unknown_block_id: Option<BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize).filter(|ty| !ty.is_placeholder())
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn load_from_path(blocks_path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let blocks_toml = fs::read_to_string(blocks_path)?;
        Ok(Self::from_toml_str(&blocks_toml)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, BlockConfigError> {
        let cfg: BlocksConfig = toml::from_str(s)?;
        Self::from_configs(cfg)
    }

    /// Builds the registry. Id 0 is reserved for `air`; if the config does not
    /// define it, an `air` entry is inserted there.
    pub fn from_configs(cfg: BlocksConfig) -> Result<Self, BlockConfigError> {
        let mut defs = cfg.blocks;
        if !defs.iter().any(|d| d.name == "air") {
            let mut air = BlockDef::simple("air", false);
            air.id = Some(0);
            defs.insert(0, air);
        }
        let mut reg = BlockRegistry::new();
        for def in defs.into_iter() {
            let id = def.id.unwrap_or(reg.blocks.len() as u16);
            let slot = id as usize;
            if slot >= reg.blocks.len() {
                reg.blocks.resize_with(slot + 1, BlockType::placeholder);
            }
            if !reg.blocks[slot].is_placeholder() {
                return Err(BlockConfigError::DuplicateId { id, name: def.name });
            }
            let solid = def.solid.unwrap_or(def.name != "air");
            let state_schema = def.state_schema.unwrap_or_default();
            let (state_fields, prop_index) = compute_state_layout(&state_schema);
            for tag in &def.tags {
                reg.by_tag.entry(tag.clone()).or_default().push(id);
            }
            reg.blocks[slot] = BlockType {
                id,
                replaceable: def.replaceable.unwrap_or(false) || def.name == "air",
                name: def.name,
                solid,
                tags: def.tags,
                state_fields,
                prop_index,
            };
        }
        reg.by_name = reg
            .blocks
            .iter()
            .filter(|t| !t.is_placeholder())
            .map(|t| (t.name.clone(), t.id))
            .collect();
        if let Some(name) = cfg.unknown_block {
            reg.unknown_block_id = reg.id_by_name(&name);
            if reg.unknown_block_id.is_none() {
                log::warn!(target: "blocks", "unknown_block `{}` is not defined; falling back to air", name);
            }
        }
        Ok(reg)
    }

    pub fn block_by_name(&self, name: &str) -> Result<Block, BlockConfigError> {
        self.id_by_name(name)
            .map(Block::new)
            .ok_or_else(|| BlockConfigError::UnknownBlock(name.to_string()))
    }

    /// Resolves `name` with optional state properties, e.g. `thickness = "tip"`.
    pub fn make_block_by_name(
        &self,
        name: &str,
        props: Option<&HashMap<String, String>>,
    ) -> Result<Block, BlockConfigError> {
        let block = self.block_by_name(name)?;
        let Some(props) = props else {
            return Ok(block);
        };
        let ty = self
            .get(block.id)
            .ok_or_else(|| BlockConfigError::UnknownBlock(name.to_string()))?;
        for key in props.keys() {
            if !ty.prop_index.contains_key(key) {
                return Err(BlockConfigError::UnknownProperty {
                    block: name.to_string(),
                    prop: key.clone(),
                });
            }
        }
        Ok(block.with_state(ty.pack_state(props)))
    }

    /// Falls back to the configured unknown block, then air.
    pub fn block_or_unknown(&self, name: &str) -> Block {
        match self.id_by_name(name) {
            Some(id) => Block::new(id),
            None => Block::new(self.unknown_block_id.unwrap_or(0)),
        }
    }

    #[inline]
    pub fn is_solid(&self, block: Block) -> bool {
        self.get(block.id).is_some_and(|ty| ty.is_solid(block.state))
    }

    /// Passable for growth: air or a non-solid replaceable block.
    #[inline]
    pub fn is_free(&self, block: Block) -> bool {
        self.get(block.id)
            .is_some_and(|ty| !ty.solid && ty.replaceable)
    }

    pub fn has_tag(&self, block: Block, tag: &str) -> bool {
        self.get(block.id)
            .is_some_and(|ty| ty.tags.iter().any(|t| t == tag))
    }

    pub fn ids_with_tag(&self, tag: &str) -> &[BlockId] {
        self.by_tag.get(tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn name_of(&self, block: Block) -> &str {
        self.get(block.id).map(|ty| ty.name.as_str()).unwrap_or("?")
    }
}

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub replaceable: bool,
    pub tags: Vec<String>,
    // Precomputed, sorted layout for fast state packing/unpacking
    pub state_fields: Vec<StateField>,
    pub prop_index: HashMap<String, usize>,
}

impl BlockType {
    fn placeholder() -> Self {
        BlockType {
            id: 0,
            name: String::new(),
            solid: false,
            replaceable: false,
            tags: Vec::new(),
            state_fields: Vec::new(),
            prop_index: HashMap::new(),
        }
    }

    #[inline]
    fn is_placeholder(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_solid(&self, _state: BlockState) -> bool {
        self.solid
    }

    /// Value of `prop` encoded in `state`; the first listed value when unset.
    pub fn state_prop_value<'a>(&'a self, state: BlockState, prop: &str) -> Option<&'a str> {
        let f = &self.state_fields[*self.prop_index.get(prop)?];
        let idx = u32::from(state).checked_shr(f.offset).unwrap_or(0) & f.mask();
        f.values.get(idx as usize).map(String::as_str)
    }

    /// Packs named property values; unknown values select the first entry.
    pub fn pack_state(&self, props: &HashMap<String, String>) -> BlockState {
        self.state_fields.iter().fold(0u32, |acc, f| {
            let sel = props
                .get(&f.name)
                .and_then(|v| f.values.iter().position(|s| s == v))
                .unwrap_or(0) as u32;
            acc | (sel & f.mask()).checked_shl(f.offset).unwrap_or(0)
        }) as BlockState
    }
}

/// One property's slice of the packed state word.
#[derive(Clone, Debug)]
pub struct StateField {
    pub name: String,
    pub values: Vec<String>,
    pub bits: u32,
    pub offset: u32,
}

impl StateField {
    #[inline]
    fn mask(&self) -> u32 {
        if self.bits == 0 { 0 } else { (1u32 << self.bits) - 1 }
    }
}

/// Fields in name order, each wide enough for its value list.
fn compute_state_layout(
    schema: &HashMap<String, Vec<String>>,
) -> (Vec<StateField>, HashMap<String, usize>) {
    let mut names: Vec<&String> = schema.keys().collect();
    names.sort();
    let mut offset = 0u32;
    let fields: Vec<StateField> = names
        .into_iter()
        .map(|name| {
            let values = schema[name].clone();
            let bits = match values.len() {
                0 | 1 => 0,
                n => usize::BITS - (n - 1).leading_zeros(),
            };
            let field = StateField {
                name: name.clone(),
                values,
                bits,
                offset,
            };
            offset = offset.saturating_add(bits);
            field
        })
        .collect();
    let index = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.clone(), i))
        .collect();
    (fields, index)
}
