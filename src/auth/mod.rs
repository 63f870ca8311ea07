use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;

pub mod roles {
    pub const ADMIN: &str = "ROLE_ADMIN";
    pub const USER: &str = "ROLE_USER";
    pub const ALL: [&str; 2] = [ADMIN, USER];
}

/// The employee behind a verified bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub employee_id: i32,
    pub user_name: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(roles::ADMIN)
    }

    /// Admins may read everything a user can
    pub fn can_read(&self) -> bool {
        self.is_admin() || self.has_role(roles::USER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Employee user name
    pub sub: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_name: String, roles: Vec<String>, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| JwtError::TokenGeneration(format!("token expiry of {} hours is out of range", expiry_hours)))?;

        Ok(Self {
            sub: user_name,
            roles,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// bcrypt is CPU bound; keep it off the async workers
pub async fn hash_password(password: String, cost: u32) -> Result<String, bcrypt::BcryptError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .unwrap_or_else(|e| Err(bcrypt::BcryptError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, bcrypt::BcryptError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .unwrap_or_else(|e| Err(bcrypt::BcryptError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        let mut security = AppConfig::development().security;
        security.jwt_secret = "test-secret".to_string();
        security
    }

    #[test]
    fn issued_tokens_round_trip_their_claims() {
        let security = security();
        let claims = Claims::new("alice".to_string(), vec![roles::USER.to_string()], 1).unwrap();
        let token = generate_jwt(&claims, &security).unwrap();

        let decoded = validate_jwt(&token, &security).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.roles, vec!["ROLE_USER"]);
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let claims = Claims::new("alice".to_string(), vec![], 1).unwrap();
        let token = generate_jwt(&claims, &security()).unwrap();

        let mut other = security();
        other.jwt_secret = "other-secret".to_string();
        assert!(matches!(validate_jwt(&token, &other), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_tokens() {
        let security = security();
        let mut claims = Claims::new("alice".to_string(), vec![], 1).unwrap();
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&claims, &security).unwrap();
        assert!(validate_jwt(&token, &security).is_err());
    }

    #[test]
    fn refuses_empty_secret() {
        let mut security = security();
        security.jwt_secret.clear();
        let claims = Claims::new("alice".to_string(), vec![], 1).unwrap();
        assert!(matches!(generate_jwt(&claims, &security), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn out_of_range_expiry_is_an_error() {
        assert!(matches!(
            Claims::new("alice".to_string(), vec![], u64::MAX),
            Err(JwtError::TokenGeneration(_))
        ));
        assert!(matches!(
            Claims::new("alice".to_string(), vec![], i64::MAX as u64),
            Err(JwtError::TokenGeneration(_))
        ));

        let claims = Claims::new("alice".to_string(), vec![], 24).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[tokio::test]
    async fn hashes_and_verifies_passwords() {
        let hash = hash_password("s3cret!".to_string(), 4).await.unwrap();
        assert_ne!(hash, "s3cret!");
        assert!(verify_password("s3cret!".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }
}
