use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZoneConfigError {
    #[error("failed to parse zone config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("zone `{0}` registered twice")]
    DuplicateZone(String),
    #[error("zone `{id}` has invalid weight {weight}; weights must be positive and finite")]
    InvalidWeight { id: String, weight: f32 },
    #[error("zone size must be positive, got {0}")]
    InvalidSize(i32),
}
