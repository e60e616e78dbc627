//! Stochastic pillar scatter on cave floors and ceilings.
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod feature;
pub mod observer;
pub mod placer;
pub mod provider;
pub mod surface;

pub use config::{FeatureDef, PlacementDef, ScatterConfig, ScatterConfigDef, load_feature_from_path};
pub use error::ScatterConfigError;
pub use feature::{FeaturePlacement, FeatureReport, ScatterFeature};
pub use observer::{CollectingObserver, LogObserver, ScatterEvent, ScatterObserver};
pub use placer::{ScatterOutcome, ScatterPlacer};
pub use provider::{BlockStateProvider, IntDistribution, LayerBlockProvider};
