// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access tokens for the storage API.
//!
//! In the cluster the daemon runs under workload identity, so tokens come
//! from the GCE metadata server and are cached until shortly before expiry.
//! A static token bypasses the metadata server for local runs and tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::types::MetadataToken;
use super::GcsError;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Renew this long before the reported expiry.
const EXPIRY_SKEW: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Clone)]
enum Inner {
    Static(String),
    Metadata {
        url: String,
        cache: Arc<Mutex<Option<CachedToken>>>,
    },
}

/// Where bearer tokens come from.
#[derive(Clone)]
pub struct TokenSource {
    inner: Inner,
}

impl TokenSource {
    /// A fixed token, never refreshed.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            inner: Inner::Static(token.into()),
        }
    }

    /// The GCE metadata server, with caching.
    pub fn metadata() -> Self {
        Self::metadata_at(METADATA_TOKEN_URL)
    }

    /// Metadata source with an explicit URL, for tests.
    pub fn metadata_at(url: impl Into<String>) -> Self {
        Self {
            inner: Inner::Metadata {
                url: url.into(),
                cache: Arc::new(Mutex::new(None)),
            },
        }
    }

    /// A bearer token valid for at least the next few seconds.
    pub async fn token(&self, http: &reqwest::Client) -> Result<String, GcsError> {
        match &self.inner {
            Inner::Static(token) => Ok(token.clone()),
            Inner::Metadata { url, cache } => {
                if let Some(cached) = cache.lock().as_ref() {
                    if cached.expires_at > Instant::now() {
                        return Ok(cached.token.clone());
                    }
                }
                debug!("fetching access token from metadata server");
                let response = http
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(GcsError::Status {
                        status: response.status().as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    });
                }
                let minted: MetadataToken = response.json().await?;
                let ttl = Duration::from_secs(minted.expires_in).saturating_sub(EXPIRY_SKEW);
                *cache.lock() = Some(CachedToken {
                    token: minted.access_token.clone(),
                    expires_at: Instant::now() + ttl,
                });
                Ok(minted.access_token)
            }
        }
    }
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Inner::Static(_) => f.write_str("TokenSource::Static(..)"),
            Inner::Metadata { url, .. } => {
                f.debug_struct("TokenSource::Metadata").field("url", url).finish()
            }
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
