use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::user::Role;

/// JWT-related errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Token validation failed: {0}")]
    TokenValidation(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Revocation store error: {0}")]
    Revocation(String),
}

impl From<redis::RedisError> for JwtError {
    fn from(err: redis::RedisError) -> Self {
        JwtError::Revocation(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            _ => JwtError::TokenValidation(err.to_string()),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub token_type: TokenType,
    pub role: Role,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|e| JwtError::TokenValidation(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Token pair (access + refresh)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret_key: String,
    pub access_token_expiry: Duration,
    pub refresh_token_expiry: Duration,
    pub algorithm: Algorithm,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn from_auth_config(auth: &AuthConfig) -> Self {
        Self {
            secret_key: auth.jwt_secret.clone(),
            access_token_expiry: Duration::minutes(auth.access_ttl_minutes),
            refresh_token_expiry: Duration::days(auth.refresh_ttl_days),
            ..Self::default()
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_token_expiry: Duration::minutes(15),
            refresh_token_expiry: Duration::days(7),
            algorithm: Algorithm::HS256,
            issuer: "academy-backend".to_string(),
            audience: "academy-api".to_string(),
        }
    }
}

/// Storage for revoked token ids. Entries only need to outlive the token.
pub trait RevocationStore: Send + Sync {
    fn revoke<'a>(&'a self, jti: &'a str, ttl_secs: u64) -> BoxFuture<'a, Result<(), JwtError>>;
    fn is_revoked<'a>(&'a self, jti: &'a str) -> BoxFuture<'a, Result<bool, JwtError>>;
}

#[derive(Clone)]
pub struct RedisRevocationStore {
    redis: ConnectionManager,
}

impl RedisRevocationStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(jti: &str) -> String {
        format!("revoked:{}", jti)
    }
}

impl RevocationStore for RedisRevocationStore {
    fn revoke<'a>(&'a self, jti: &'a str, ttl_secs: u64) -> BoxFuture<'a, Result<(), JwtError>> {
        Box::pin(async move {
            let mut conn = self.redis.clone();
            conn.set_ex::<_, _, ()>(Self::key(jti), "1", ttl_secs).await?;
            Ok(())
        })
    }

    fn is_revoked<'a>(&'a self, jti: &'a str) -> BoxFuture<'a, Result<bool, JwtError>> {
        Box::pin(async move {
            let mut conn = self.redis.clone();
            let exists: bool = conn.exists(Self::key(jti)).await?;
            Ok(exists)
        })
    }
}

pub struct JwtService {
    config: JwtConfig,
    revocations: Arc<dyn RevocationStore>,
}

impl JwtService {
    pub fn new(config: JwtConfig, revocations: Arc<dyn RevocationStore>) -> Self {
        Self {
            config,
            revocations,
        }
    }

    pub fn access_token_expiry(&self) -> Duration {
        self.config.access_token_expiry
    }

    fn issue(&self, user_id: Uuid, role: Role, token_type: TokenType) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiry = match token_type {
            TokenType::Access => self.config.access_token_expiry,
            TokenType::Refresh => self.config.refresh_token_expiry,
        };

        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + expiry).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            token_type,
            role,
        };

        let encoding_key = EncodingKey::from_secret(self.config.secret_key.as_bytes());
        encode(&Header::new(self.config.algorithm), &claims, &encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(&self, user_id: Uuid, role: Role) -> Result<TokenPair, JwtError> {
        let access_token = self.issue(user_id, role, TokenType::Access)?;
        let refresh_token = self.issue(user_id, role, TokenType::Refresh)?;

        debug!(user_id = %user_id, role = %role, "Token pair generated");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_token_expiry.num_seconds(),
            token_type: "Bearer".to_string(),
        })
    }

    /// Signature, expiry, issuer and audience checks only.
    pub fn decode_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let decoding_key = DecodingKey::from_secret(self.config.secret_key.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Full validation: decodes, checks the expected type and the revocation list.
    pub async fn validate_token(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<Claims, JwtError> {
        let claims = self.decode_token(token)?;

        if claims.token_type != expected {
            return Err(JwtError::InvalidToken);
        }

        if self.revocations.is_revoked(&claims.jti).await? {
            return Err(JwtError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Validates a refresh token and revokes it, so it can be used once.
    /// The caller re-reads the account before issuing a new pair.
    pub async fn redeem_refresh_token(&self, refresh_token: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(refresh_token, TokenType::Refresh).await?;
        self.revoke_claims(&claims).await?;

        info!(user_id = %claims.sub, "Refresh token redeemed");

        Ok(claims)
    }

    /// Revokes the caller's refresh token on logout. A token that belongs to
    /// someone else, or is not a refresh token, is rejected. An already
    /// expired one needs no entry.
    pub async fn revoke_refresh_token(
        &self,
        refresh_token: &str,
        user_id: Uuid,
    ) -> Result<(), JwtError> {
        let claims = match self.decode_token(refresh_token) {
            Ok(claims) => claims,
            Err(JwtError::TokenExpired) => return Ok(()),
            Err(err) => return Err(err),
        };

        if claims.token_type != TokenType::Refresh || claims.user_id()? != user_id {
            return Err(JwtError::InvalidToken);
        }

        self.revoke_claims(&claims).await
    }

    pub async fn revoke_token(&self, token: &str) -> Result<(), JwtError> {
        let claims = self.decode_token(token)?;
        self.revoke_claims(&claims).await
    }

    async fn revoke_claims(&self, claims: &Claims) -> Result<(), JwtError> {
        let remaining = claims.exp - Utc::now().timestamp();
        if remaining <= 0 {
            // already unusable
            return Ok(());
        }

        self.revocations.revoke(&claims.jti, remaining as u64).await?;
        warn!(jti = %claims.jti, user_id = %claims.sub, "Token revoked");
        Ok(())
    }
}
