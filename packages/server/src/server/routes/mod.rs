// HTTP handlers, one module per domain surface
pub mod access;
pub mod commissions;
pub mod corrections;
pub mod documents;
pub mod health;
pub mod participation;
pub mod results;
pub mod territorial;

pub use health::health_handler;
