use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtAuth {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    access_ttl_secs: i64,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            access_ttl_secs: config.access_ttl_secs,
        }
    }

    pub fn create_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
        roles: &[String],
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            roles: roles.to_vec(),
            exp: (now + Duration::seconds(self.access_ttl_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Checks signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(ttl: i64) -> JwtAuth {
        let config = JwtConfig::new("test-secret-key-that-is-long-enough-32")
            .unwrap()
            .with_access_ttl(ttl);
        JwtAuth::new(&config)
    }

    #[test]
    fn issued_token_verifies() {
        let auth = auth(900);
        let user_id = Uuid::now_v7();
        let token = auth
            .create_access_token(user_id, "ann@example.com", "Ann", &["user".to_string()])
            .unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "ann@example.com");
        assert_eq!(claims.roles, vec!["user".to_string()]);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtAuth::new(&JwtConfig::new("another-secret-key-that-is-also-32-chars").unwrap());
        let token = other
            .create_access_token(Uuid::now_v7(), "a@b.c", "A", &[])
            .unwrap();

        assert!(auth(900).verify_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60s leeway.
        let auth = auth(-120);
        let token = auth
            .create_access_token(Uuid::now_v7(), "a@b.c", "A", &[])
            .unwrap();

        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(auth(900).verify_token("not.a.jwt").is_err());
    }
}
