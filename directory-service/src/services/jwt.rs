use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::services::ability::Role;
use service_core::error::AppError;

/// JWT service for bearer-token generation and verification (HS256,
/// shared secret).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_minutes: i64,
}

/// Claims carried by a directory bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: the caller's own user record id. Absent for tokens that are
    /// not tied to a directory record (e.g. admin tokens).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Uuid>,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            token_expiry_minutes: config.token_expiry_minutes,
        }
    }

    /// Generate a signed token for a caller.
    pub fn generate_token(&self, sub: Option<Uuid>, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub,
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode token: {}", e)))?;

        Ok(token)
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn validate_token(
        &self,
        token: &str,
    ) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}
