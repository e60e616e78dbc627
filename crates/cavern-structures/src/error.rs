use cavern_blocks::BlockConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScatterConfigError {
    #[error("failed to parse feature config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Block(#[from] BlockConfigError),
    #[error("height range is empty or negative: min_height={min}, max_height={max}")]
    InvalidHeightRange { min: i32, max: i32 },
    #[error("`{field}` must be within [0, 1], got {value}")]
    ChanceOutOfRange { field: &'static str, value: f32 },
    #[error("`{field}` must be finite and non-negative, got {value}")]
    NegativeValue { field: &'static str, value: f32 },
    #[error("`{field}` has an empty range ({min}..={max}) or a negative deviation")]
    InvalidDistribution { field: &'static str, min: i32, max: i32 },
    #[error("`{field}` may be at most {limit}, got {value}")]
    TooLarge { field: &'static str, value: i32, limit: i32 },
    #[error("`{0}` lists no blocks")]
    EmptyProvider(&'static str),
}
