//! Zone registry, weighted zone tree, and seeded zone maps.
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod map;
pub mod rng;
pub mod source;
pub mod tree;
pub mod zone;

pub use config::{ZoneSourceConfig, load_zone_source_from_path};
pub use error::ZoneConfigError;
pub use map::{MapStack, SquareZoneMap, ZoneCacheStats, ZoneMap, ZoneMapBuilder};
pub use rng::{GenRandom, WorldRandom};
pub use source::SpatialZoneMap;
pub use tree::{WeightedList, ZoneHandle, ZoneNode, ZoneTree};
pub use zone::{ZoneDef, ZoneFilter, ZoneId, ZoneRegistry};
