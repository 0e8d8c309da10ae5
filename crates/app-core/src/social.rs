//! Verification of identity tokens issued by external social-login providers.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);
const CLOCK_SKEW_LEEWAY_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("{0} provider is not supported")]
    UnsupportedProvider(String),

    #[error("{0} access token is not valid")]
    InvalidToken(SocialProvider),

    #[error("Provider signing keys are unavailable")]
    KeysUnavailable(#[from] reqwest::Error),
}

/// The closed set of identity providers this gateway can verify tokens for.
///
/// Parsing an unknown provider name fails with
/// [`SocialError::UnsupportedProvider`]; there is deliberately no catch-all
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialProvider {
    Google,
}

impl SocialProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialProvider::Google => "google",
        }
    }
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialProvider {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(SocialProvider::Google),
            other => Err(SocialError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[async_trait::async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait SocialTokenVerifier: Send + Sync {
    /// Checks the signature, audience, and expiry of a provider-issued token.
    ///
    /// May fetch the provider's published signing keys over the network. No
    /// retries happen here; retry policy belongs to the caller.
    async fn verify(&self, provider: SocialProvider, access_token: &str) -> Result<(), SocialError>;
}

/// A JSON Web Key Set as published by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: Option<String>,
    #[serde(rename = "use")]
    pub use_: Option<String>,
    pub alg: Option<String>,
    /// RSA modulus, base64url encoded.
    pub n: String,
    /// RSA public exponent, base64url encoded.
    pub e: String,
}

#[derive(Debug, Deserialize)]
struct GoogleIdClaims {
    sub: String,
}

struct CachedKeys {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Verifies Google-issued OIDC ID tokens against Google's published JWKS.
///
/// The key set is cached for an hour; a token referencing an unknown `kid`
/// forces one refetch to tolerate provider key rotation.
pub struct GoogleIdTokenVerifier {
    audience: String,
    http: Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl GoogleIdTokenVerifier {
    pub fn new(audience: String) -> Self {
        Self { audience, http: Client::new(), keys: RwLock::new(None) }
    }

    async fn verify_id_token(&self, token: &str) -> Result<(), SocialError> {
        let header = decode_header(token).map_err(|err| {
            tracing::debug!("google id token header is not decodable: {err}");
            SocialError::InvalidToken(SocialProvider::Google)
        })?;

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("google id token is missing the kid header");
            SocialError::InvalidToken(SocialProvider::Google)
        })?;

        let jwk = self.signing_key(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|err| {
            tracing::debug!(kid, "google signing key is not a usable RSA key: {err}");
            SocialError::InvalidToken(SocialProvider::Google)
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;

        let data = decode::<GoogleIdClaims>(token, &decoding_key, &validation).map_err(|err| {
            tracing::debug!("google id token failed validation: {err}");
            SocialError::InvalidToken(SocialProvider::Google)
        })?;

        tracing::debug!(sub = %data.claims.sub, "google id token verified");

        Ok(())
    }

    /// Returns the JWK matching `kid`, refetching the key set once if the
    /// cached copy is stale or does not contain the key.
    async fn signing_key(&self, kid: &str) -> Result<Jwk, SocialError> {
        if let Some(jwk) = self.cached_key(kid).await {
            return Ok(jwk);
        }

        let jwks = self.fetch_jwks().await?;
        let found = jwks.find_key(kid).cloned();

        *self.keys.write().await = Some(CachedKeys { jwks, fetched_at: Instant::now() });

        found.ok_or_else(|| {
            tracing::debug!(kid, "no google signing key matches the token");
            SocialError::InvalidToken(SocialProvider::Google)
        })
    }

    async fn cached_key(&self, kid: &str) -> Option<Jwk> {
        let guard = self.keys.read().await;
        let cached = guard.as_ref()?;

        if cached.fetched_at.elapsed() >= JWKS_CACHE_TTL {
            return None;
        }

        cached.jwks.find_key(kid).cloned()
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, SocialError> {
        let jwks = self
            .http
            .get(GOOGLE_JWKS_URL)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;

        Ok(jwks)
    }
}

/// Dispatches verification to the strategy bound to each supported provider.
pub struct SocialVerifier {
    google: GoogleIdTokenVerifier,
}

impl SocialVerifier {
    pub fn new(google_audience: String) -> Self {
        Self { google: GoogleIdTokenVerifier::new(google_audience) }
    }
}

#[async_trait::async_trait]
impl SocialTokenVerifier for SocialVerifier {
    async fn verify(&self, provider: SocialProvider, access_token: &str) -> Result<(), SocialError> {
        match provider {
            SocialProvider::Google => self.google.verify_id_token(access_token).await,
        }
    }
}
