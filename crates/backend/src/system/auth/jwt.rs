use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;

use crate::shared::config::AuthConfig;

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;

/// HMAC keys for access tokens
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Keys from `[auth] jwt_secret`; an empty secret gets a random one,
    /// which invalidates tokens on every restart.
    pub fn from_config(config: &AuthConfig) -> Self {
        if config.jwt_secret.trim().is_empty() {
            tracing::warn!("auth.jwt_secret is empty, generated a random secret for this process");
            Self::from_secret(&generate_jwt_secret())
        } else {
            Self::from_secret(&config.jwt_secret)
        }
    }

    /// Generate an access token with 24 hours lifetime
    pub fn generate_access_token(
        &self,
        user_id: &str,
        username: &str,
        is_admin: bool,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize;
        let iat = now.timestamp() as usize;

        let claims = TokenClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            is_admin,
            exp,
            iat,
        };

        encode(&Header::default(), &claims, &self.encoding).context("Failed to encode JWT token")
    }

    /// Validate token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        let token_data = decode::<TokenClaims>(token, &self.decoding, &Validation::default())
            .context("Failed to decode JWT token")?;
        Ok(token_data.claims)
    }
}

/// Cryptographically secure secret (256 bits)
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let keys = JwtKeys::from_secret("test-secret");
        let token = keys.generate_access_token("user-1", "alice", false).unwrap();
        let claims = keys.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "alice");
        assert!(!claims.is_admin);
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = JwtKeys::from_secret("one")
            .generate_access_token("user-1", "alice", false)
            .unwrap();
        assert!(JwtKeys::from_secret("two").validate_token(&token).is_err());
    }

    #[test]
    fn test_empty_secret_generates_working_keys() {
        let keys = JwtKeys::from_config(&AuthConfig::default());
        let token = keys.generate_access_token("u", "u", true).unwrap();
        assert!(keys.validate_token(&token).unwrap().is_admin);
    }
}
