use crate::common::error::{Result, SchoolError};
use crate::domain::{Role, User, Viewer};
use crate::storage::Storage;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// bcrypt hashing, run on the blocking thread pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| SchoolError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(SchoolError::from)
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| SchoolError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(SchoolError::from)
    }
}

/// Payload of the tokens issued at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            iat,
            exp: iat + self.ttl_seconds,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
/// A missing header is not an error.
pub fn bearer_token(header: Option<&str>) -> Result<Option<&str>> {
    let Some(header) = header else {
        return Ok(None);
    };
    let (scheme, token) = header.trim().split_once(' ').unwrap_or((header.trim(), ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(SchoolError::Validation(
            "Authorization header is invalid".to_string(),
        ));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(SchoolError::Validation("Token is missing".to_string()));
    }
    Ok(Some(token))
}

/// Read the claims of a token without checking its signature or expiry.
///
/// Only good for deciding what to display; anything that grants access
/// must go through [`JwtKeys::verify`].
pub fn peek_claims(token: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    Ok(decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?.claims)
}

/// Resolves the caller of a request from its `Authorization` header.
#[derive(Clone)]
pub struct Authenticator {
    keys: JwtKeys,
    storage: Arc<dyn Storage>,
}

impl Authenticator {
    pub fn new(keys: JwtKeys, storage: Arc<dyn Storage>) -> Self {
        Self { keys, storage }
    }

    /// Any failure leaves the request anonymous.
    pub async fn viewer(&self, header: Option<&str>) -> Option<Viewer> {
        let token = match bearer_token(header) {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                warn!("Rejected authorization header: {}", e);
                return None;
            }
        };

        let claims = match self.keys.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Rejected bearer token: {}", e);
                return None;
            }
        };

        match self.storage.get_user_by_id(claims.id).await {
            Ok(Some(user)) => Some(Viewer::from(&user)),
            Ok(None) => {
                debug!("Token subject {} no longer exists", claims.id);
                None
            }
            Err(e) => {
                warn!("Failed to load token subject {}: {}", claims.id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    fn student() -> User {
        User::new("user@user.com", "student", "hash".to_string(), Role::User)
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("secret").await.unwrap();
        assert_ne!(hash, "secret");
        assert!(hasher.verify("secret", &hash).await.unwrap());
        assert!(!hasher.verify("other", &hash).await.unwrap());
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = JwtKeys::new("test-secret", 3600);
        let user = student();
        let claims = keys.verify(&keys.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_and_foreign_tokens_are_rejected() {
        let user = student();
        let expired = JwtKeys::new("test-secret", -10).issue(&user).unwrap();
        assert!(JwtKeys::new("test-secret", 3600).verify(&expired).is_err());

        let foreign = JwtKeys::new("other-secret", 3600).issue(&user).unwrap();
        let err = JwtKeys::new("test-secret", 3600).verify(&foreign).unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_peek_ignores_signature() {
        let user = student();
        let token = JwtKeys::new("other-secret", -10).issue(&user).unwrap();
        assert_eq!(peek_claims(&token).unwrap().email, "user@user.com");
        assert!(peek_claims("not-a-token").is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(None).unwrap(), None);
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), Some("abc"));
        assert_eq!(
            bearer_token(Some("Basic abc")).unwrap_err().to_string(),
            "Authorization header is invalid"
        );
        assert_eq!(
            bearer_token(Some("Bearer ")).unwrap_err().to_string(),
            "Token is missing"
        );
    }

    #[tokio::test]
    async fn test_viewer_requires_live_user() {
        let storage = Arc::new(InMemoryStorage::new());
        let keys = JwtKeys::new("test-secret", 3600);
        let user = student();
        storage.create_user(&user).await.unwrap();

        let auth = Authenticator::new(keys.clone(), storage.clone());
        let header = format!("Bearer {}", keys.issue(&user).unwrap());

        let viewer = auth.viewer(Some(&header)).await.unwrap();
        assert_eq!(viewer.id, user.id);
        assert!(auth.viewer(Some("Bearer garbage")).await.is_none());
        assert!(auth.viewer(None).await.is_none());

        storage.delete_user(user.id).await.unwrap();
        assert!(auth.viewer(Some(&header)).await.is_none());
    }
}
