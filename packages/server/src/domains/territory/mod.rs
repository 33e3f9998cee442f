pub mod activities;
pub mod data;
pub mod index;
pub mod models;

pub use index::TerritoryIndex;
pub use models::{AncestryLabel, NodeKind, TerritorialNode};
