// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Models for the workflow platform's status endpoint.
//!
//! Jobs send logs back through the platform while they run; the monitor
//! polls the `/workflow` endpoint and maps what it finds onto local states.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::JobState;

/// Workflow states reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Submitted,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

crate::simple_display! {
    WorkflowStatus {
        Submitted => "SUBMITTED",
        Running => "RUNNING",
        Succeeded => "SUCCEEDED",
        Failed => "FAILED",
        Unknown => "UNKNOWN",
    }
}

/// Raw `workflow` object inside the platform response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowFields {
    pub run_name: String,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub exit_status: Option<i64>,
    #[serde(default)]
    pub error_report: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowEnvelope {
    pub workflow: WorkflowFields,
}

/// Response page from `GET /workflow`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPage {
    pub workflows: Vec<WorkflowEnvelope>,
    pub total_size: u64,
}

/// A single workflow log entry, reduced to the fields the monitor consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteLog {
    pub run_name: String,
    pub start: Option<DateTime<Utc>>,
    pub status: WorkflowStatus,
    pub exit_status: Option<i64>,
    /// First line of the platform's error report, if any.
    pub error_report: Option<String>,
}

impl RemoteLog {
    /// Extract the single log entry from a response page.
    ///
    /// An empty page means the workflow hasn't started logging yet. More
    /// than one match should never happen for an exact search, so it is
    /// treated the same as no match, loudly.
    pub fn from_page(page: WorkflowPage) -> Option<Self> {
        match page.total_size {
            0 => {
                info!("no workflow found on the platform");
                None
            }
            1 => page.workflows.into_iter().next().map(|envelope| {
                let workflow = envelope.workflow;
                RemoteLog {
                    run_name: workflow.run_name,
                    start: workflow.start,
                    status: workflow.status,
                    exit_status: workflow.exit_status,
                    error_report: workflow
                        .error_report
                        .and_then(|report| report.lines().next().map(str::to_string)),
                }
            }),
            n => {
                warn!(total_size = n, "more than one workflow in response, skipping");
                None
            }
        }
    }

    /// Map the platform status onto the local state it implies, if any.
    pub fn job_state(&self) -> Option<JobState> {
        match self.status {
            WorkflowStatus::Succeeded => Some(JobState::Succeeded),
            WorkflowStatus::Failed | WorkflowStatus::Unknown => Some(JobState::Failed),
            WorkflowStatus::Running => Some(JobState::Deployed),
            WorkflowStatus::Submitted => None,
        }
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
