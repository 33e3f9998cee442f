use serde::{Deserialize, Serialize};

use crate::common::ApiError;

/// Authenticated caller identity, extracted from a verified bearer token.
///
/// The role string is opaque here; it is only interpreted by the role
/// capability table in the access domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub role: String,
}

/// Per-request identity, present on every request (possibly anonymous).
///
/// Inserted by the auth middleware so handlers never read ambient state.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthUser>);

impl CurrentUser {
    pub fn authenticated(user: AuthUser) -> Self {
        Self(Some(user))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    /// Require an authenticated caller, or fail with `Unauthorized`.
    pub fn require(&self) -> Result<&AuthUser, ApiError> {
        self.0.as_ref().ok_or(ApiError::Unauthorized)
    }
}
