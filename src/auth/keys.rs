//! Process-wide cache of the identity provider's signing keys.
//!
//! The JWKS document is fetched lazily and replaced wholesale when the TTL
//! lapses. Redundant refreshes under race are harmless: the cached value is
//! immutable data and last-write-wins.

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("signing key request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("signing key material is invalid: {0}")]
    BadKey(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

struct CachedKeys {
    keys: Arc<HashMap<String, DecodingKey>>,
    expires_at: Instant,
}

/// TTL-cached map of `kid` to RSA decoding key.
pub struct KeyCache {
    url: String,
    ttl: Duration,
    http: reqwest::Client,
    cached: RwLock<Option<CachedKeys>>,
}

impl KeyCache {
    pub fn new(url: String, ttl: Duration) -> Self {
        Self {
            url,
            ttl,
            http: reqwest::Client::new(),
            cached: RwLock::new(None),
        }
    }

    /// Current key set, fetching if the cache is empty or stale.
    pub async fn keys(&self) -> Result<Arc<HashMap<String, DecodingKey>>, KeyFetchError> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if entry.expires_at > Instant::now() {
                    return Ok(entry.keys.clone());
                }
            }
        }
        self.refresh().await
    }

    /// Force a fetch, replacing whatever is cached. Used directly when a
    /// token references a `kid` the cached set does not know (key rotation).
    pub async fn refresh(&self) -> Result<Arc<HashMap<String, DecodingKey>>, KeyFetchError> {
        let document: JwksDocument = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut keys = HashMap::with_capacity(document.keys.len());
        for jwk in document.keys {
            let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?;
            keys.insert(jwk.kid, key);
        }
        let keys = Arc::new(keys);

        let mut cached = self.cached.write().await;
        *cached = Some(CachedKeys {
            keys: keys.clone(),
            expires_at: Instant::now() + self.ttl,
        });
        info!("refreshed {} signing keys from {}", keys.len(), self.url);

        Ok(keys)
    }
}
