// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource-handler seam between the state machine and the cloud.
//!
//! The machine only knows the [`ResourceHandler`] contract; the concrete
//! Google implementation lives in the adapters crate. [`NoopHandler`] backs
//! dry runs (tests, CLI template rendering).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::id::JobId;
use crate::request::JobRequest;
use crate::state::JobState;

/// Handler state that must survive a process restart.
///
/// `release_installed` gates chart uninstall on destroy; the
/// existed-on-create flags protect buckets the handler did not create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerFlags {
    pub work_bucket_existed_on_create: bool,
    pub results_bucket_existed_on_create: bool,
    pub release_installed: bool,
}

/// Provision and reclaim the per-job compute resources.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Create everything the job needs: buckets, rendered chart values, and
    /// the installed release. Must record partial progress in the flags so
    /// a later destroy can skip what never existed.
    async fn create_resources(&mut self, request: &JobRequest) -> Result<(), ResourceError>;

    /// Tear down the job's resources. The results bucket is only removed
    /// when the job failed; buckets that existed before creation are never
    /// touched.
    async fn destroy_resources(&mut self, state: JobState) -> Result<(), ResourceError>;

    /// Snapshot of the durable flags, for persistence.
    fn flags(&self) -> HandlerFlags;
}

/// Reconstruct a handler for a stored job.
///
/// The store persists jobs as plain records; rehydrating one needs the
/// process-wide clients (storage, chart, settings) that only the factory
/// owner has.
pub trait HandlerFactory: Send + Sync {
    fn handler(&self, id: &JobId, flags: HandlerFlags) -> Box<dyn ResourceHandler>;
}

/// A handler that does nothing, for dry runs.
#[derive(Debug, Default, Clone)]
pub struct NoopHandler {
    flags: HandlerFlags,
}

impl NoopHandler {
    pub fn new(flags: HandlerFlags) -> Self {
        Self { flags }
    }
}

#[async_trait]
impl ResourceHandler for NoopHandler {
    async fn create_resources(&mut self, _request: &JobRequest) -> Result<(), ResourceError> {
        Ok(())
    }

    async fn destroy_resources(&mut self, _state: JobState) -> Result<(), ResourceError> {
        Ok(())
    }

    fn flags(&self) -> HandlerFlags {
        self.flags
    }
}

/// Factory producing [`NoopHandler`]s, for dry runs.
#[derive(Debug, Default, Clone)]
pub struct NoopHandlerFactory;

impl HandlerFactory for NoopHandlerFactory {
    fn handler(&self, _id: &JobId, flags: HandlerFlags) -> Box<dyn ResourceHandler> {
        Box::new(NoopHandler::new(flags))
    }
}

/// Errors provisioning or reclaiming resources.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// A target bucket already existed when the job was created. The
    /// pre-existing bucket must never be modified or deleted.
    #[error("bucket {name} already exists")]
    BucketExists { name: String },

    #[error("cloud storage request failed: {0}")]
    Storage(String),

    #[error("chart values could not be rendered: {0}")]
    Render(String),

    #[error("chart install failed: {0}")]
    Install(String),

    #[error("chart uninstall failed: {0}")]
    Uninstall(String),
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
