use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockConfigError {
    #[error("failed to parse blocks config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate block id {id} for `{name}`")]
    DuplicateId { id: u16, name: String },
    #[error("unknown block `{0}`")]
    UnknownBlock(String),
    #[error("block `{block}` has no state property `{prop}`")]
    UnknownProperty { block: String, prop: String },
}
