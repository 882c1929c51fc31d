// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Google resource handler: per-job buckets plus a chart release.
//!
//! Partial failure is the interesting case. Every step records what it
//! managed to do in the handler flags, so a destroy after a botched create
//! only touches what actually exists, and never a bucket that was already
//! there before the job.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use vatti_chart::render_values;
use vatti_core::{
    HandlerFlags, JobId, JobRequest, JobState, ResourceError, ResourceHandler, Settings,
};

use crate::gcs::{Bucket, GcsClient, IamConfiguration, Lifecycle, LifecycleRule, SoftDeletePolicy};
use crate::helm;

/// File suffixes guaranteed to contain sensitive data; the work bucket
/// deletes them after a day regardless of what the workflow leaves behind.
const SENSITIVE_SUFFIXES: &[&str] = &[
    ".vcf", ".pgen", ".pvar", ".psam", ".bim", ".bed", ".fam", ".zst", ".gz",
];

/// Provisions and reclaims buckets and the chart release for one job.
pub struct GoogleResourceHandler {
    id: JobId,
    settings: Arc<Settings>,
    gcs: GcsClient,
    flags: HandlerFlags,
    work_bucket: String,
    results_bucket: String,
}

impl GoogleResourceHandler {
    pub fn new(id: JobId, settings: Arc<Settings>, gcs: GcsClient, flags: HandlerFlags) -> Self {
        let bucket_root = format!("{}-{}", settings.namespace.as_str(), id.release_name());
        Self {
            work_bucket: format!("{bucket_root}-work"),
            results_bucket: format!("{bucket_root}-results"),
            id,
            settings,
            gcs,
            flags,
        }
    }

    pub fn work_bucket(&self) -> &str {
        &self.work_bucket
    }

    pub fn results_bucket(&self) -> &str {
        &self.results_bucket
    }

    /// The work bucket has much stricter lifecycle policies than the
    /// results bucket: everything sensitive is gone after a day.
    fn work_bucket_config(&self) -> Bucket {
        Bucket {
            name: self.work_bucket.clone(),
            location: Some(self.settings.gcp_location.clone()),
            lifecycle: Some(Lifecycle {
                rule: vec![
                    LifecycleRule::abort_multipart_after(1),
                    LifecycleRule::delete_by_suffix(1, SENSITIVE_SUFFIXES),
                ],
            }),
            iam_configuration: Some(IamConfiguration::locked_down()),
            soft_delete_policy: Some(SoftDeletePolicy::disabled()),
            time_created: None,
        }
    }

    /// Results stay live for 7 days.
    fn results_bucket_config(&self) -> Bucket {
        Bucket {
            name: self.results_bucket.clone(),
            location: Some(self.settings.gcp_location.clone()),
            lifecycle: Some(Lifecycle {
                rule: vec![
                    LifecycleRule::delete_after(7),
                    LifecycleRule::abort_multipart_after(1),
                ],
            }),
            iam_configuration: Some(IamConfiguration::locked_down()),
            soft_delete_policy: Some(SoftDeletePolicy::disabled()),
            time_created: None,
        }
    }

    async fn make_work_bucket(&mut self) -> Result<(), ResourceError> {
        if self.gcs.bucket_exists(&self.work_bucket).await.map_err(storage)? {
            error!(bucket = %self.work_bucket, "bucket exists");
            error!("this bucket won't get cleaned up automatically by the error state");
            self.flags.work_bucket_existed_on_create = true;
            return Err(ResourceError::BucketExists {
                name: self.work_bucket.clone(),
            });
        }
        self.gcs
            .create_bucket(&self.work_bucket_config())
            .await
            .map_err(storage)
    }

    async fn make_results_bucket(&mut self) -> Result<(), ResourceError> {
        if self
            .gcs
            .bucket_exists(&self.results_bucket)
            .await
            .map_err(storage)?
        {
            error!(bucket = %self.results_bucket, "bucket exists");
            self.flags.results_bucket_existed_on_create = true;
            return Err(ResourceError::BucketExists {
                name: self.results_bucket.clone(),
            });
        }
        self.gcs
            .create_bucket(&self.results_bucket_config())
            .await
            .map_err(storage)
    }

    async fn delete_work_bucket(&self) -> Result<(), ResourceError> {
        if self.flags.work_bucket_existed_on_create {
            // a bad job must not interfere with an existing good job
            warn!(
                bucket = %self.work_bucket,
                "work bucket existed during creation, so not deleting it"
            );
            return Ok(());
        }
        self.delete_bucket_if_present(&self.work_bucket).await
    }

    async fn delete_results_bucket(&self) -> Result<(), ResourceError> {
        if self.flags.results_bucket_existed_on_create {
            warn!(
                bucket = %self.results_bucket,
                "results bucket existed during creation, so not deleting it"
            );
            return Ok(());
        }
        self.delete_bucket_if_present(&self.results_bucket).await
    }

    async fn delete_bucket_if_present(&self, bucket: &str) -> Result<(), ResourceError> {
        if !self.gcs.bucket_exists(bucket).await.map_err(storage)? {
            info!(bucket, "bucket not found, so not deleting");
            return Ok(());
        }
        self.gcs.delete_bucket_force(bucket).await.map_err(storage)
    }
}

fn storage(err: crate::gcs::GcsError) -> ResourceError {
    ResourceError::Storage(err.to_string())
}

#[async_trait]
impl ResourceHandler for GoogleResourceHandler {
    /// Create the buckets, render the chart values, and install the release.
    async fn create_resources(&mut self, request: &JobRequest) -> Result<(), ResourceError> {
        info!(id = %self.id, "creating buckets");
        self.make_work_bucket().await?;
        self.make_results_bucket().await?;

        info!(id = %self.id, "triggering helm install");
        let values = render_values(request, &self.work_bucket, &self.results_bucket, &self.settings)
            .map_err(|e| ResourceError::Render(e.to_string()))?;
        let yaml = values.to_yaml().map_err(|e| ResourceError::Render(e.to_string()))?;
        helm::install(
            &self.id.release_name(),
            &self.settings.chart_path,
            self.settings.namespace,
            &yaml,
        )
        .await?;
        self.flags.release_installed = true;
        Ok(())
    }

    /// Uninstall the release if it was installed, then reclaim the buckets.
    /// The results bucket survives unless the job failed.
    async fn destroy_resources(&mut self, state: JobState) -> Result<(), ResourceError> {
        if self.flags.release_installed {
            helm::uninstall(&self.id.release_name(), self.settings.namespace).await?;
        }
        self.delete_work_bucket().await?;
        if state == JobState::Failed {
            self.delete_results_bucket().await?;
        }
        Ok(())
    }

    fn flags(&self) -> HandlerFlags {
        self.flags
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
