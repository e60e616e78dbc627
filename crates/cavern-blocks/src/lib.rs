//! Block ids, the block registry, and block predicates.
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod predicate;
pub mod registry;
pub mod types;

pub use error::BlockConfigError;
pub use predicate::{BlockPredicate, CompiledPredicate};
pub use registry::BlockRegistry;
pub use types::{Block, BlockId, BlockState};
