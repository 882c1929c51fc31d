// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stale-bucket garbage collection.
//!
//! A safety net behind the per-job cleanup: anything matching the job
//! bucket prefix that has been around longer than the retention window is
//! removed, whatever state its job ended in.

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::gcs::{GcsClient, GcsError};

/// Buckets older than this are eligible for collection.
const MAX_BUCKET_AGE_DAYS: i64 = 14;

/// Delete stale buckets whose names start with `prefix`.
///
/// Failures on individual buckets are logged and do not stop the sweep.
pub async fn bucket_clean_up(gcs: &GcsClient, prefix: &str) -> Result<(), GcsError> {
    let cutoff = Utc::now() - Duration::days(MAX_BUCKET_AGE_DAYS);
    let buckets = gcs.list_buckets(Some(prefix)).await?;

    for bucket in buckets {
        if !bucket.name.starts_with(prefix) {
            continue;
        }
        let Some(created) = bucket.time_created else {
            continue;
        };
        if created >= cutoff {
            continue;
        }
        info!(bucket = %bucket.name, %created, "deleting stale bucket");
        if let Err(err) = gcs.delete_bucket_force(&bucket.name).await {
            warn!(bucket = %bucket.name, error = %err, "failed to delete stale bucket");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "gc_tests.rs"]
mod tests;
