//! Issues and decodes the locally-signed session tokens (JWTs).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default session lifetime: three hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3 * 60 * 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JwtError {
    #[error("JWT signing secret is empty or missing")]
    MissingSecret,

    #[error("Failed to sign session token")]
    Signing,

    #[error("Invalid token format or signature")]
    InvalidToken,
}

/// The claim set embedded in every issued session token.
///
/// `roles` carries one entry per role assigned to the user, in whatever order
/// the store returned them; consumers must treat it as a set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub name: String,
    pub email: String,
    pub jti: String,
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

#[cfg_attr(feature = "testing", mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue_session_token(&self, email: &str, roles: &[String]) -> Result<String, JwtError>;
    fn decode_session_token(&self, token: &str) -> Result<SessionClaims, JwtError>;
}

pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_secs: i64,
}

pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    /// Rejects an empty or blank secret up front: a misconfigured signing key
    /// must fail deployment at startup, not individual requests later.
    pub fn new(config: JwtConfig) -> Result<Self, JwtError> {
        if config.secret.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }

        Ok(Self { config })
    }
}

impl TokenIssuer for JwtService {
    fn issue_session_token(&self, email: &str, roles: &[String]) -> Result<String, JwtError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.config.ttl_secs);

        let claims = SessionClaims {
            name: email.to_string(),
            email: email.to_string(),
            jti: Uuid::new_v4().to_string(),
            roles: roles.to_vec(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &EncodingKey::from_secret(self.config.secret.as_bytes()))
            .map_err(|_| JwtError::Signing)
    }

    fn decode_session_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<SessionClaims>(token, &DecodingKey::from_secret(self.config.secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|_| JwtError::InvalidToken)
    }
}
