use std::sync::Arc;

use axum::{middleware::Next, response::Response};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{AuthUser, CurrentUser};

/// JWT claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// Creates and verifies bearer tokens.
#[derive(Clone)]
pub struct AuthVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl AuthVerifier {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Issue a token for a user. Tokens expire after 24 hours.
    pub fn create_token(&self, user_id: &str, role: &str) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: (now + chrono::Duration::hours(24)).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    pub fn verify_token(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

/// JWT authentication middleware.
///
/// Extracts the bearer token from the Authorization header, verifies it and
/// inserts a `CurrentUser` into the request extensions. A missing or invalid
/// token yields an anonymous `CurrentUser`; handlers decide whether the
/// operation needs authentication.
pub async fn jwt_auth_middleware(
    verifier: Arc<AuthVerifier>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let current = match extract_auth_user(&request, &verifier) {
        Some(user) => {
            debug!("Authenticated user: {} ({})", user.user_id, user.role);
            CurrentUser::authenticated(user)
        }
        None => {
            debug!("No valid authentication token");
            CurrentUser::anonymous()
        }
    };
    request.extensions_mut().insert(current);

    next.run(request).await
}

fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    verifier: &AuthVerifier,
) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Handle both "Bearer <token>" and a raw token
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    let claims = verifier.verify_token(token).ok()?;
    Some(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let verifier = AuthVerifier::new("test_secret", "test_issuer".to_string());
        let token = verifier.create_token("agent-7", "administrateur").unwrap();

        let claims = verifier.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "agent-7");
        assert_eq!(claims.role, "administrateur");
        assert_eq!(claims.iss, "test_issuer");
    }

    #[test]
    fn test_wrong_secret_fails() {
        let issuer = AuthVerifier::new("secret1", "test_issuer".to_string());
        let other = AuthVerifier::new("secret2", "test_issuer".to_string());

        let token = issuer.create_token("agent-7", "administrateur").unwrap();
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn test_extract_token_with_bearer() {
        let verifier = AuthVerifier::new("test_secret", "test_issuer".to_string());
        let token = verifier.create_token("agent-7", "administrateur").unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let user = extract_auth_user(&request, &verifier).unwrap();
        assert_eq!(user.user_id, "agent-7");
    }

    #[test]
    fn test_extract_token_without_bearer() {
        let verifier = AuthVerifier::new("test_secret", "test_issuer".to_string());
        let token = verifier.create_token("agent-7", "superviseur-regional").unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", token)
            .body(axum::body::Body::empty())
            .unwrap();

        let user = extract_auth_user(&request, &verifier).unwrap();
        assert_eq!(user.role, "superviseur-regional");
    }

    #[test]
    fn test_no_auth_header() {
        let verifier = AuthVerifier::new("test_secret", "test_issuer".to_string());
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &verifier).is_none());
    }

    #[test]
    fn test_invalid_token() {
        let verifier = AuthVerifier::new("test_secret", "test_issuer".to_string());
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer invalid_token")
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &verifier).is_none());
    }
}
