//! Representation of the conflict data between scan chains

mod conflict_model;
pub mod generators;
mod indexer;
mod source;
pub mod stats;

pub use conflict_model::{ConflictModel, ScanChain};
pub use indexer::CellIndexer;
pub use source::{build_model, ConflictSource};
