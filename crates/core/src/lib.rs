// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vatti-core: job states, the per-job state machine, and the wire models
//! shared by the daemon, store, chart renderer, and adapters.

pub mod macros;

pub mod handler;
pub mod id;
pub mod job;
pub mod notify;
pub mod remote;
pub mod request;
pub mod settings;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use handler::{
    HandlerFactory, HandlerFlags, NoopHandler, NoopHandlerFactory, ResourceHandler, ResourceError,
};
pub use id::{IdError, JobId};
pub use job::{Job, JobError, JobRecord, MachineError, NotifySender, Trigger};
pub use notify::StatusMessage;
pub use remote::{RemoteLog, WorkflowPage, WorkflowStatus};
pub use request::{
    GenomeBuild, GlobusConfig, GlobusFile, JobRequest, PipelineParams, RequestError,
    SamplesheetFormat, ScoringParams, SecretKeyDetails, TargetFormat, TargetGenome,
};
pub use settings::{BusSettings, Namespace, Settings, SettingsError};
pub use state::JobState;
