// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle states.
//!
//! The wire form (Kafka notifications) and the persisted form (SQLite `state`
//! column) are both title-case, enforced downstream by a schema CHECK
//! constraint.

use serde::{Deserialize, Serialize};

/// State of a job in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// The launch message was read from the bus, nothing provisioned yet.
    Requested,
    /// Resources exist and the chart release is installed.
    Created,
    /// The workflow is live on the cluster and reporting logs.
    Deployed,
    /// The workflow reported completion.
    Succeeded,
    /// The workflow errored, timed out, or a hook raised while provisioning.
    Failed,
}

crate::simple_display! {
    JobState {
        Requested => "Requested",
        Created => "Created",
        Deployed => "Deployed",
        Succeeded => "Succeeded",
        Failed => "Failed",
    }
}

impl JobState {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// All states, in lifecycle order.
    pub const ALL: [JobState; 5] = [
        JobState::Requested,
        JobState::Created,
        JobState::Deployed,
        JobState::Succeeded,
        JobState::Failed,
    ];
}

impl std::str::FromStr for JobState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Requested" => Ok(JobState::Requested),
            "Created" => Ok(JobState::Created),
            "Deployed" => Ok(JobState::Deployed),
            "Succeeded" => Ok(JobState::Succeeded),
            "Failed" => Ok(JobState::Failed),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

/// A state string that is not one of the five known states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job state: {0:?}")]
pub struct UnknownState(pub String);

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
