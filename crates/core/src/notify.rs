// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status messages published to the backend.
//!
//! The wire contract is state-dependent: `Failed` messages always carry the
//! `trace_name` and `trace_exit` keys (null when unknown), every other state
//! must omit them. Serialization is written by hand to keep that contract
//! independent of which fields happen to be populated.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use crate::state::JobState;

/// A message updating the backend about job state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusMessage {
    pub run_name: String,
    pub utc_time: DateTime<Utc>,
    pub event: JobState,
    /// Name of the failed process (first line of the error report).
    #[serde(default)]
    pub trace_name: Option<String>,
    /// Exit status of the failed process.
    #[serde(default)]
    pub trace_exit: Option<i64>,
}

impl StatusMessage {
    /// Build a message for a state change happening now.
    pub fn new(run_name: impl Into<String>, event: JobState) -> Self {
        Self {
            run_name: run_name.into(),
            utc_time: Utc::now(),
            event,
            trace_name: None,
            trace_exit: None,
        }
    }

    pub fn with_trace(mut self, trace_name: Option<String>, trace_exit: Option<i64>) -> Self {
        self.trace_name = trace_name;
        self.trace_exit = trace_exit;
        self
    }
}

impl Serialize for StatusMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let failed = self.event == JobState::Failed;
        let fields = if failed { 5 } else { 3 };
        let mut s = serializer.serialize_struct("StatusMessage", fields)?;
        s.serialize_field("run_name", &self.run_name)?;
        s.serialize_field("utc_time", &self.utc_time)?;
        s.serialize_field("event", &self.event)?;
        if failed {
            s.serialize_field("trace_name", &self.trace_name)?;
            s.serialize_field("trace_exit", &self.trace_exit)?;
        }
        s.end()
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
