use serde::Deserialize;
use std::collections::HashMap;

// Top-level blocks config file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    // Name of the block used when a requested block is unavailable. If absent
    // or not found, lookups fall back to `air`.
    #[serde(default)]
    pub unknown_block: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub solid: Option<bool>,
    // Non-solid blocks that growth may pass through (plants, fluids). Air is
    // always free.
    #[serde(default)]
    pub replaceable: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub state_schema: Option<HashMap<String, Vec<String>>>,
}

impl BlockDef {
    pub fn simple(name: &str, solid: bool) -> Self {
        Self {
            name: name.to_string(),
            id: None,
            solid: Some(solid),
            replaceable: None,
            tags: Vec::new(),
            state_schema: None,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}
