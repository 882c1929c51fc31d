// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the subset of the storage JSON API vatti uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bucket resource, reduced to the fields vatti reads and writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_configuration: Option<IamConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_delete_policy: Option<SoftDeletePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lifecycle {
    pub rule: Vec<LifecycleRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleRule {
    pub action: LifecycleAction,
    pub condition: LifecycleCondition,
}

impl LifecycleRule {
    /// Delete objects once they reach `age` days.
    pub fn delete_after(age: u32) -> Self {
        Self {
            action: LifecycleAction {
                kind: "Delete".to_string(),
            },
            condition: LifecycleCondition {
                age: Some(age),
                matches_suffix: None,
            },
        }
    }

    /// Delete objects matching any suffix once they reach `age` days.
    pub fn delete_by_suffix(age: u32, suffixes: &[&str]) -> Self {
        Self {
            action: LifecycleAction {
                kind: "Delete".to_string(),
            },
            condition: LifecycleCondition {
                age: Some(age),
                matches_suffix: Some(suffixes.iter().map(|s| s.to_string()).collect()),
            },
        }
    }

    /// Abort incomplete multipart uploads once they reach `age` days.
    pub fn abort_multipart_after(age: u32) -> Self {
        Self {
            action: LifecycleAction {
                kind: "AbortIncompleteMultipartUpload".to_string(),
            },
            condition: LifecycleCondition {
                age: Some(age),
                matches_suffix: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleAction {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleCondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches_suffix: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamConfiguration {
    pub uniform_bucket_level_access: UniformBucketLevelAccess,
    /// `enforced` or `inherited`.
    pub public_access_prevention: String,
}

impl IamConfiguration {
    /// Public access blocked, uniform bucket-level access on.
    pub fn locked_down() -> Self {
        Self {
            uniform_bucket_level_access: UniformBucketLevelAccess { enabled: true },
            public_access_prevention: "enforced".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformBucketLevelAccess {
    pub enabled: bool,
}

/// The API encodes the retention as a stringified number of seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftDeletePolicy {
    pub retention_duration_seconds: String,
}

impl SoftDeletePolicy {
    pub fn disabled() -> Self {
        Self {
            retention_duration_seconds: "0".to_string(),
        }
    }
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketPage {
    #[serde(default)]
    pub items: Vec<Bucket>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// An object resource; only the name matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct Object {
    pub name: String,
}

/// One page of an object listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPage {
    #[serde(default)]
    pub items: Vec<Object>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// An access token minted by the metadata server.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataToken {
    pub access_token: String,
    pub expires_in: u64,
}
