//! Identity claims verification for bearer tokens.
//!
//! Tokens are checked in a fixed order, each check a distinct failure
//! cause: structure, expiry, issue time, audience, issuer, subject, then
//! signature. The claim checks read the payload directly (decoded by hand)
//! so their ordering is independent of any JWT library's validation policy;
//! the signature pass runs last through `jsonwebtoken` against the cached
//! provider keys.
//!
//! When no key cache is configured the verifier runs claims-only. That mode
//! exists for development and tests; production configuration wires a JWKS
//! URL so tokens with forged signatures are rejected.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use thiserror::Error;

pub mod keys;

pub use keys::{KeyCache, KeyFetchError};

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is structurally malformed")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token was issued in the future")]
    NotYetValid,

    #[error("audience does not match the configured project")]
    AudienceMismatch,

    #[error("issuer is not trusted")]
    UntrustedIssuer,

    #[error("subject claim is missing or empty")]
    MissingSubject,

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("token references an unknown signing key")]
    UnknownKeyId,

    #[error(transparent)]
    KeyFetch(#[from] KeyFetchError),
}

/// Claims accepted from a verified token, attached to the request for the
/// duration of that request only.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    pub subject: String,
    pub email: Option<String>,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    email: Option<String>,
    exp: Option<i64>,
    iat: Option<i64>,
    aud: Option<String>,
    iss: Option<String>,
}

pub struct TokenVerifier {
    project_id: String,
    trusted_issuer: String,
    keys: Option<KeyCache>,
}

impl TokenVerifier {
    pub fn new(project_id: String, trusted_issuer: String) -> Self {
        Self {
            project_id,
            trusted_issuer,
            keys: None,
        }
    }

    pub fn with_key_cache(mut self, cache: KeyCache) -> Self {
        self.keys = Some(cache);
        self
    }

    /// Build a verifier from configuration, wiring the signing-key cache
    /// when a JWKS URL is configured.
    pub fn from_config(auth: &AuthConfig) -> Self {
        let verifier = Self::new(auth.project_id.clone(), auth.trusted_issuer.clone());
        match &auth.jwks_url {
            Some(url) => verifier.with_key_cache(KeyCache::new(
                url.clone(),
                std::time::Duration::from_secs(auth.key_cache_ttl_secs),
            )),
            None => {
                tracing::warn!(
                    "no JWKS URL configured: token signatures will NOT be verified"
                );
                verifier
            }
        }
    }

    /// Verify a bearer token's claims (and signature, when keys are
    /// configured) and extract the stable subject identifier.
    pub async fn verify(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedClaims, TokenError> {
        let claims = decode_payload(token)?;
        let now = now.timestamp();

        if let Some(exp) = claims.exp {
            if exp < now {
                return Err(TokenError::Expired);
            }
        }

        if let Some(iat) = claims.iat {
            if iat > now {
                return Err(TokenError::NotYetValid);
            }
        }

        if claims.aud.as_deref() != Some(self.project_id.as_str()) {
            return Err(TokenError::AudienceMismatch);
        }

        match &claims.iss {
            Some(iss) if iss.contains(&self.trusted_issuer) => {}
            _ => return Err(TokenError::UntrustedIssuer),
        }

        let subject = match claims.sub {
            Some(sub) if !sub.is_empty() => sub,
            _ => return Err(TokenError::MissingSubject),
        };

        self.verify_signature(token).await?;

        Ok(VerifiedClaims {
            subject,
            email: claims.email,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    async fn verify_signature(&self, token: &str) -> Result<(), TokenError> {
        let Some(cache) = &self.keys else {
            return Ok(());
        };

        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        let kid = header.kid.ok_or(TokenError::UnknownKeyId)?;

        let mut keys = cache.keys().await?;
        if !keys.contains_key(&kid) {
            // The provider rotates keys; a miss may just mean our cache
            // predates the rotation.
            keys = cache.refresh().await?;
        }
        let key = keys.get(&kid).ok_or(TokenError::UnknownKeyId)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<serde_json::Value>(token, key, &validation)
            .map_err(|_| TokenError::InvalidSignature)?;
        Ok(())
    }
}

/// Decode the payload segment without trusting anything else about the
/// token. Three dot-separated segments, base64url (unpadded) JSON middle.
fn decode_payload(token: &str) -> Result<RawClaims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1])
        .map_err(|_| TokenError::Malformed)?;

    serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)
}
