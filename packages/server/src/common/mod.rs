pub mod auth;
pub mod error;

pub use auth::{AuthUser, CurrentUser};
pub use error::ApiError;
