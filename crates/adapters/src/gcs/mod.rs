// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed client for the storage JSON API.
//!
//! Only the handful of calls the resource handler and the bucket GC need:
//! bucket existence, creation with lifecycle/IAM config, object listing and
//! deletion, bucket deletion, and a prefix-filtered bucket listing.

mod auth;
mod types;

pub use auth::TokenSource;
pub use types::{
    Bucket, BucketPage, IamConfiguration, Lifecycle, LifecycleRule, Object, ObjectPage,
    SoftDeletePolicy,
};

use reqwest::{StatusCode, Url};
use tracing::{info, warn};

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com/storage/v1";

/// Above this many objects a bucket deletion logs loudly; the objects are
/// removed one by one either way, since buckets only delete when empty.
const BIG_BUCKET_THRESHOLD: usize = 256;

/// Google Cloud Storage client.
#[derive(Debug, Clone)]
pub struct GcsClient {
    http: reqwest::Client,
    base_url: String,
    project: String,
    auth: TokenSource,
}

impl GcsClient {
    pub fn new(project: impl Into<String>, auth: TokenSource) -> Self {
        Self::with_base_url(project, auth, DEFAULT_BASE_URL)
    }

    /// Client with an explicit API root, for tests.
    pub fn with_base_url(
        project: impl Into<String>,
        auth: TokenSource,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            project: project.into(),
            auth,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn url(&self, segments: &[&str]) -> Result<Url, GcsError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GcsError::Url(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| GcsError::Url(self.base_url.clone()))?
            .extend(segments);
        Ok(url)
    }

    async fn token(&self) -> Result<String, GcsError> {
        self.auth.token(&self.http).await
    }

    /// Does a bucket with this name exist (in any project)?
    pub async fn bucket_exists(&self, name: &str) -> Result<bool, GcsError> {
        let token = self.token().await?;
        let response = self
            .http
            .get(self.url(&["b", name])?)
            .bearer_auth(token)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(GcsError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Create a bucket in the client's project.
    pub async fn create_bucket(&self, bucket: &Bucket) -> Result<(), GcsError> {
        let token = self.token().await?;
        let mut url = self.url(&["b"])?;
        url.query_pairs_mut().append_pair("project", &self.project);
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(bucket)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// All object names in a bucket.
    pub async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, GcsError> {
        let token = self.token().await?;
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.url(&["b", bucket, "o"])?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }
            let response = self
                .http
                .get(url)
                .bearer_auth(token.clone())
                .send()
                .await?;
            let page: ObjectPage = check_status(response).await?.json().await?;
            names.extend(page.items.into_iter().map(|o| o.name));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(names)
    }

    pub async fn delete_object(&self, bucket: &str, object: &str) -> Result<(), GcsError> {
        let token = self.token().await?;
        let response = self
            .http
            .delete(self.url(&["b", bucket, "o", object])?)
            .bearer_auth(token)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Delete an empty bucket.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<(), GcsError> {
        let token = self.token().await?;
        let response = self
            .http
            .delete(self.url(&["b", bucket])?)
            .bearer_auth(token)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Empty a bucket and delete it.
    pub async fn delete_bucket_force(&self, bucket: &str) -> Result<(), GcsError> {
        let objects = self.list_objects(bucket).await?;
        if objects.len() > BIG_BUCKET_THRESHOLD {
            warn!(bucket, count = objects.len(), "deleting a very big bucket");
        }
        for object in &objects {
            self.delete_object(bucket, object).await?;
        }
        info!(bucket, "deleting bucket");
        self.delete_bucket(bucket).await
    }

    /// Buckets in the project whose names start with `prefix`.
    pub async fn list_buckets(&self, prefix: Option<&str>) -> Result<Vec<Bucket>, GcsError> {
        let token = self.token().await?;
        let mut buckets = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.url(&["b"])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("project", &self.project);
                if let Some(prefix) = prefix {
                    query.append_pair("prefix", prefix);
                }
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }
            let response = self
                .http
                .get(url)
                .bearer_auth(token.clone())
                .send()
                .await?;
            let page: BucketPage = check_status(response).await?.json().await?;
            buckets.extend(page.items);
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(buckets)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GcsError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GcsError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

/// Errors talking to the storage API.
#[derive(Debug, thiserror::Error)]
pub enum GcsError {
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("bad storage URL: {0}")]
    Url(String),
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
