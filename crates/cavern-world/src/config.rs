use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::error::ZoneConfigError;
use crate::zone::ZoneFilter;

/// `zone_source.toml`: layout of the spatial zone map.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ZoneSourceConfig {
    /// Horizontal cell size in blocks.
    #[serde(default = "default_zone_size")]
    pub zone_size: i32,
    /// Height of one vertical band in blocks.
    #[serde(default = "default_zone_size_vertical")]
    pub zone_size_vertical: i32,
    #[serde(default = "default_use_vertical_zones")]
    pub use_vertical_zones: bool,
    #[serde(default)]
    pub filter: ZoneFilter,
}

fn default_zone_size() -> i32 {
    256
}
fn default_zone_size_vertical() -> i32 {
    86
}
fn default_use_vertical_zones() -> bool {
    true
}

impl Default for ZoneSourceConfig {
    fn default() -> Self {
        Self {
            zone_size: default_zone_size(),
            zone_size_vertical: default_zone_size_vertical(),
            use_vertical_zones: default_use_vertical_zones(),
            filter: ZoneFilter::default(),
        }
    }
}

impl ZoneSourceConfig {
    pub fn validate(&self) -> Result<(), ZoneConfigError> {
        if self.zone_size <= 0 {
            return Err(ZoneConfigError::InvalidSize(self.zone_size));
        }
        if self.zone_size_vertical <= 0 {
            return Err(ZoneConfigError::InvalidSize(self.zone_size_vertical));
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ZoneConfigError> {
        let cfg: ZoneSourceConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn load_zone_source_from_path(path: &Path) -> Result<ZoneSourceConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    Ok(ZoneSourceConfig::from_toml_str(&s)?)
}
