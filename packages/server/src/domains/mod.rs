pub mod access;
pub mod commissions;
pub mod corrections;
pub mod documents;
pub mod participation;
pub mod results;
pub mod tally;
pub mod territory;
