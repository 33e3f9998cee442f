pub mod activities;
pub mod data;
pub mod models;
pub mod resolver;

pub use models::{AccessGrant, AccessLevel, Capability};
pub use resolver::{can_access, require_access};
