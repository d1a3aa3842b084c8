// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching, caching and key resolution.
//!
//! ## Security
//!
//! - Remote key sets are fetched over HTTPS (enforced when the URL is configured)
//! - Keys are cached with a configurable TTL
//! - An unknown `kid` triggers one refetch, rate limited by a minimum interval
//! - Stale cache is used on fetch failure (fail-open for availability)
//!
//! ## Usage
//!
//! Build a `JwksManager` from `JWKS_URL` in main.rs and hand it to the
//! `TokenValidator`. Static key sets serve tests and pinned deployments.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default minimum spacing between refetches caused by unknown key IDs.
const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP timeout for JWKS requests.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Key resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum KeyResolveError {
    #[error("no key with id '{0}' in the signing key set")]
    KeyNotFound(String),

    #[error("unsupported signing key: {0}")]
    UnsupportedKey(String),

    #[error("failed to fetch signing key set: {0}")]
    Fetch(String),

    #[error("failed to build JWKS HTTP client: {0}")]
    HttpClient(String),
}

/// A verification key and the algorithm it is meant for.
#[derive(Clone)]
pub struct ResolvedKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

/// Where key sets come from.
#[derive(Clone)]
enum KeySource {
    Remote { url: String, client: reqwest::Client },
    Static(Arc<JwkSet>),
}

/// JWKS cache entry.
struct CacheEntry {
    jwks: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Most recent failed fetch.
struct FetchFailure {
    at: Instant,
    error: String,
}

/// Shared cache state: the last good key set and the last failure since it.
#[derive(Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    last_failure: Option<FetchFailure>,
}

/// Availability of the signing key set, as seen by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySetStatus {
    /// A key set within its TTL.
    Fresh,
    /// An expired key set, still served while refetches fail.
    Stale,
    /// No key set has been loaded; holds the last fetch error, if any.
    Unavailable(Option<String>),
}

/// JWKS manager with caching.
///
/// Cheap to clone; clones share the same cache. Lookups take the read lock,
/// refreshes swap in a whole new set under the write lock, so an in-flight
/// lookup always sees one consistent snapshot.
///
/// After a failed fetch no further fetch is attempted until
/// `min_refresh_interval` has passed; lookups meanwhile use the stale set.
#[derive(Clone)]
pub struct JwksManager {
    source: KeySource,
    /// Cache TTL
    cache_ttl: Duration,
    /// Minimum time between refetches after a rotation miss or a failure
    min_refresh_interval: Duration,
    /// Cached JWKS
    cache: Arc<RwLock<CacheState>>,
}

impl JwksManager {
    /// Create a manager that fetches from a remote endpoint.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g., `https://tenant.auth0.com/.well-known/jwks.json`)
    pub fn remote(jwks_url: impl Into<String>) -> Result<Self, KeyResolveError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| KeyResolveError::HttpClient(e.to_string()))?;

        Ok(Self {
            source: KeySource::Remote {
                url: jwks_url.into(),
                client,
            },
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            cache: Arc::new(RwLock::new(CacheState::default())),
        })
    }

    /// Create a manager over a fixed key set that never expires.
    pub fn from_jwks(jwks: JwkSet) -> Self {
        let jwks = Arc::new(jwks);
        Self {
            source: KeySource::Static(jwks.clone()),
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            cache: Arc::new(RwLock::new(CacheState {
                entry: Some(CacheEntry {
                    jwks,
                    fetched_at: Instant::now(),
                }),
                last_failure: None,
            })),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Create with a custom minimum interval between refetches.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Get the JWKS URL, if the key set is remote.
    pub fn jwks_url(&self) -> Option<&str> {
        match &self.source {
            KeySource::Remote { url, .. } => Some(url),
            KeySource::Static(_) => None,
        }
    }

    /// Resolve the verification key for `kid`.
    pub async fn resolve(&self, kid: &str) -> Result<ResolvedKey, KeyResolveError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = find_key(&jwks, kid) {
            return jwk_to_decoding_key(jwk);
        }

        // Unknown kid: the provider may have rotated its keys since our fetch.
        if let Some(jwks) = self.refresh_for_rotation().await {
            if let Some(jwk) = find_key(&jwks, kid) {
                return jwk_to_decoding_key(jwk);
            }
        }

        Err(KeyResolveError::KeyNotFound(kid.to_string()))
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), KeyResolveError> {
        self.fetch_and_store().await.map(|_| ())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache.entry.as_ref().is_some_and(|entry| self.is_fresh(entry))
    }

    /// Report cache state without fetching.
    pub async fn status(&self) -> KeySetStatus {
        let cache = self.cache.read().await;
        match &cache.entry {
            Some(entry) if self.is_fresh(entry) => KeySetStatus::Fresh,
            Some(_) => KeySetStatus::Stale,
            None => KeySetStatus::Unavailable(
                cache.last_failure.as_ref().map(|f| f.error.clone()),
            ),
        }
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<Arc<JwkSet>, KeyResolveError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &cache.entry {
                if self.is_fresh(entry) {
                    return Ok(entry.jwks.clone());
                }
            }
            if let Some(failure) = self.recent_failure(&cache) {
                return match &cache.entry {
                    Some(entry) => Ok(entry.jwks.clone()),
                    None => Err(KeyResolveError::Fetch(failure.error.clone())),
                };
            }
        }

        match self.fetch_and_store().await {
            Ok(jwks) => Ok(jwks),
            Err(err) => {
                let cache = self.cache.read().await;
                match &cache.entry {
                    Some(entry) => {
                        tracing::warn!(error = %err, "JWKS refresh failed, serving stale key set");
                        Ok(entry.jwks.clone())
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Refetch after an unknown kid, unless we fetched or failed too recently.
    async fn refresh_for_rotation(&self) -> Option<Arc<JwkSet>> {
        if matches!(self.source, KeySource::Static(_)) {
            return None;
        }

        {
            let cache = self.cache.read().await;
            if self.recent_failure(&cache).is_some() {
                return None;
            }
            if let Some(entry) = &cache.entry {
                if entry.fetched_at.elapsed() < self.min_refresh_interval {
                    return None;
                }
            }
        }

        match self.fetch_and_store().await {
            Ok(jwks) => Some(jwks),
            Err(err) => {
                tracing::warn!(error = %err, "JWKS refetch for unknown key id failed");
                None
            }
        }
    }

    /// The last failure, if it is within the backoff window.
    fn recent_failure<'a>(&self, cache: &'a CacheState) -> Option<&'a FetchFailure> {
        cache
            .last_failure
            .as_ref()
            .filter(|failure| failure.at.elapsed() < self.min_refresh_interval)
    }

    async fn fetch_and_store(&self) -> Result<Arc<JwkSet>, KeyResolveError> {
        match self.fetch_jwks().await {
            Ok(jwks) => {
                let jwks = Arc::new(jwks);
                let mut cache = self.cache.write().await;
                cache.entry = Some(CacheEntry {
                    jwks: jwks.clone(),
                    fetched_at: Instant::now(),
                });
                cache.last_failure = None;
                Ok(jwks)
            }
            Err(err) => {
                let mut cache = self.cache.write().await;
                let error = match &err {
                    KeyResolveError::Fetch(reason) => reason.clone(),
                    other => other.to_string(),
                };
                cache.last_failure = Some(FetchFailure {
                    at: Instant::now(),
                    error,
                });
                Err(err)
            }
        }
    }

    /// Fetch JWKS from the source.
    async fn fetch_jwks(&self) -> Result<JwkSet, KeyResolveError> {
        let (url, client) = match &self.source {
            KeySource::Remote { url, client } => (url, client),
            KeySource::Static(jwks) => return Ok(JwkSet::clone(jwks)),
        };

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| KeyResolveError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyResolveError::Fetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| KeyResolveError::Fetch(e.to_string()))?;

        tracing::debug!(keys = jwks.keys.len(), "Fetched signing key set");
        Ok(jwks)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.source {
            KeySource::Static(_) => true,
            KeySource::Remote { .. } => entry.fetched_at.elapsed() < self.cache_ttl,
        }
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<ResolvedKey, KeyResolveError> {
    let declared = jwk.common.key_algorithm;

    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| KeyResolveError::UnsupportedKey(format!("RSA key: {e}")))?;

            let algorithm = match declared {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                _ => Algorithm::RS256,
            };

            Ok(ResolvedKey { key, algorithm })
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| KeyResolveError::UnsupportedKey(format!("EC key: {e}")))?;

            let algorithm = match declared {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok(ResolvedKey { key, algorithm })
        }
        AlgorithmParameters::OctetKeyPair(okp) => {
            let key = DecodingKey::from_ed_components(&okp.x)
                .map_err(|e| KeyResolveError::UnsupportedKey(format!("OKP key: {e}")))?;

            Ok(ResolvedKey {
                key,
                algorithm: Algorithm::EdDSA,
            })
        }
        AlgorithmParameters::OctetKey(oct) => {
            let secret = Base64UrlUnpadded::decode_vec(&oct.value)
                .map_err(|e| KeyResolveError::UnsupportedKey(format!("oct key: {e}")))?;

            let algorithm = match declared {
                Some(KeyAlgorithm::HS384) => Algorithm::HS384,
                Some(KeyAlgorithm::HS512) => Algorithm::HS512,
                _ => Algorithm::HS256,
            };

            Ok(ResolvedKey {
                key: DecodingKey::from_secret(&secret),
                algorithm,
            })
        }
        #[allow(unreachable_patterns)]
        _ => Err(KeyResolveError::UnsupportedKey(
            "unsupported key type in JWKS".to_string(),
        )),
    }
}
