// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-job state machine.
//!
//! Legal transitions live in a fixed table; firing a trigger runs the
//! table's prepare hooks, moves the state, then runs the after hooks in
//! order. Notifications are always emitted before resources are destroyed,
//! so observers see a terminal state published even if cleanup then fails.
//!
//! Any hook failure other than a [`MachineError`] forces the machine into
//! `Failed` through the `error` trigger; a machine-error raised while
//! already handling an error surfaces to the caller.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::handler::{HandlerFactory, HandlerFlags, NoopHandler, ResourceError, ResourceHandler};
use crate::id::JobId;
use crate::notify::StatusMessage;
use crate::request::JobRequest;
use crate::state::JobState;

/// Channel the `notify` hook publishes to; drained by the bus producer.
pub type NotifySender = tokio::sync::mpsc::UnboundedSender<StatusMessage>;

/// Named events that may cause a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Create,
    Deploy,
    Succeed,
    Error,
}

crate::simple_display! {
    Trigger {
        Create => "create",
        Deploy => "deploy",
        Succeed => "succeed",
        Error => "error",
    }
}

impl Trigger {
    /// The trigger that moves a job towards `target`, if one exists.
    ///
    /// This is the fixed map the monitor uses to convert a remote state
    /// into an event: Failed → error, Succeeded → succeed, Deployed → deploy.
    pub fn for_target(target: JobState) -> Option<Trigger> {
        match target {
            JobState::Failed => Some(Trigger::Error),
            JobState::Succeeded => Some(Trigger::Succeed),
            JobState::Deployed => Some(Trigger::Deploy),
            JobState::Requested | JobState::Created => None,
        }
    }
}

/// Side effects a transition can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Provision,
    Notify,
    Destroy,
}

struct Transition {
    trigger: Trigger,
    sources: &'static [JobState],
    dest: JobState,
    /// Run before the state changes; failure leaves the source state.
    prepare: &'static [Hook],
    /// Run after the state changes, in order.
    after: &'static [Hook],
}

const TRANSITIONS: &[Transition] = &[
    Transition {
        trigger: Trigger::Create,
        sources: &[JobState::Requested],
        dest: JobState::Created,
        prepare: &[Hook::Provision],
        after: &[],
    },
    Transition {
        trigger: Trigger::Deploy,
        sources: &[JobState::Created],
        dest: JobState::Deployed,
        prepare: &[],
        after: &[Hook::Notify],
    },
    Transition {
        trigger: Trigger::Succeed,
        sources: &[JobState::Deployed],
        dest: JobState::Succeeded,
        prepare: &[],
        after: &[Hook::Notify, Hook::Destroy],
    },
    Transition {
        trigger: Trigger::Error,
        sources: &[JobState::Requested, JobState::Created, JobState::Deployed],
        dest: JobState::Failed,
        prepare: &[],
        after: &[Hook::Notify, Hook::Destroy],
    },
];

/// A scored-workflow job and its state machine.
pub struct Job {
    id: JobId,
    state: JobState,
    dry_run: bool,
    trace_name: Option<String>,
    trace_exit: Option<i64>,
    handler: Box<dyn ResourceHandler>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Job {
    /// Create a job in the `Requested` state with the given handler.
    pub fn new(id: JobId, handler: Box<dyn ResourceHandler>) -> Self {
        Self {
            id,
            state: JobState::Requested,
            dry_run: false,
            trace_name: None,
            trace_exit: None,
            handler,
        }
    }

    /// Create a dry-run job backed by the no-op handler.
    pub fn dry_run(id: JobId) -> Self {
        Self {
            id,
            state: JobState::Requested,
            dry_run: true,
            trace_name: None,
            trace_exit: None,
            handler: Box::new(NoopHandler::default()),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn trace_name(&self) -> Option<&str> {
        self.trace_name.as_deref()
    }

    pub fn trace_exit(&self) -> Option<i64> {
        self.trace_exit
    }

    /// Record failure diagnostics from the platform, ahead of an `error`
    /// trigger.
    pub fn set_trace(&mut self, trace_name: Option<String>, trace_exit: Option<i64>) {
        self.trace_name = trace_name;
        self.trace_exit = trace_exit;
    }

    /// Fire a trigger.
    ///
    /// `request` is only consumed by the `create` transition. On a hook
    /// failure the machine forces itself into `Failed` (emitting the
    /// notification and destroying resources); the caller sees `Ok` for a
    /// recovered failure and a [`MachineError`] for an illegal trigger.
    pub async fn trigger(
        &mut self,
        trigger: Trigger,
        notify: &NotifySender,
        request: Option<&JobRequest>,
    ) -> Result<(), JobError> {
        let mut attempt = trigger;
        let mut request = request;
        loop {
            match self.run_transition(attempt, notify, request).await {
                Ok(()) => return Ok(()),
                Err(JobError::Machine(err)) => {
                    if attempt != trigger {
                        warn!(id = %self.id, "couldn't trigger error state");
                    }
                    return Err(JobError::Machine(err));
                }
                Err(err) => {
                    warn!(id = %self.id, error = %err, "exception raised during transition");
                    attempt = Trigger::Error;
                    request = None;
                }
            }
        }
    }

    async fn run_transition(
        &mut self,
        trigger: Trigger,
        notify: &NotifySender,
        request: Option<&JobRequest>,
    ) -> Result<(), JobError> {
        let transition = TRANSITIONS
            .iter()
            .find(|t| t.trigger == trigger && t.sources.contains(&self.state))
            .ok_or(MachineError {
                trigger,
                state: self.state,
            })?;

        for hook in transition.prepare {
            self.run_hook(*hook, notify, request).await?;
        }
        self.state = transition.dest;
        for hook in transition.after {
            self.run_hook(*hook, notify, request).await?;
        }
        Ok(())
    }

    async fn run_hook(
        &mut self,
        hook: Hook,
        notify: &NotifySender,
        request: Option<&JobRequest>,
    ) -> Result<(), JobError> {
        match hook {
            Hook::Provision => {
                info!(id = %self.id, "creating resources");
                match request {
                    Some(request) => self.handler.create_resources(request).await?,
                    // a dry run renders nothing, so nothing to provision
                    None if self.dry_run => {}
                    None => return Err(JobError::MissingRequest),
                }
            }
            Hook::Notify => {
                info!(id = %self.id, state = %self.state, "sending state notification");
                let mut message = StatusMessage::new(self.id.as_str(), self.state);
                if self.state == JobState::Failed {
                    message = message.with_trace(self.trace_name.clone(), self.trace_exit);
                }
                notify.send(message).map_err(|_| JobError::NotifyClosed)?;
            }
            Hook::Destroy => {
                info!(id = %self.id, "deleting all resources");
                self.handler.destroy_resources(self.state).await?;
            }
        }
        Ok(())
    }

    /// Snapshot the machine into its persistent record form.
    pub fn to_record(&self) -> JobRecord {
        JobRecord {
            version: JobRecord::CURRENT_VERSION,
            id: self.id.clone(),
            state: self.state,
            dry_run: self.dry_run,
            flags: self.handler.flags(),
            trace_name: self.trace_name.clone(),
            trace_exit: self.trace_exit,
        }
    }

    /// Rebuild a machine from a stored record.
    ///
    /// The stored state becomes the initial state; handler flags are handed
    /// back to the factory so cleanup guards survive restarts.
    pub fn from_record(record: JobRecord, factory: &dyn HandlerFactory) -> Self {
        let handler: Box<dyn ResourceHandler> = if record.dry_run {
            Box::new(NoopHandler::new(record.flags))
        } else {
            factory.handler(&record.id, record.flags)
        };
        Self {
            id: record.id,
            state: record.state,
            dry_run: record.dry_run,
            trace_name: record.trace_name,
            trace_exit: record.trace_exit,
            handler,
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn with_handler(id: JobId, handler: Box<dyn ResourceHandler>, state: JobState) -> Self {
        let mut job = Self::new(id, handler);
        job.state = state;
        job
    }
}

/// Versioned, serializable form of a [`Job`].
///
/// This is what the store writes to the blob column; it must round-trip
/// state, id, handler flags, and trace fields exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub version: u32,
    pub id: JobId,
    pub state: JobState,
    #[serde(default)]
    pub dry_run: bool,
    pub flags: HandlerFlags,
    #[serde(default)]
    pub trace_name: Option<String>,
    #[serde(default)]
    pub trace_exit: Option<i64>,
}

impl JobRecord {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn to_blob(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(blob)
    }
}

/// An illegal (trigger, state) pair.
///
/// Distinguishable from every other failure kind so callers can tell "this
/// transition does not exist" apart from "a side effect failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("can't trigger event {trigger} from state {state}")]
pub struct MachineError {
    pub trigger: Trigger,
    pub state: JobState,
}

/// Errors firing a trigger.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Machine(#[from] MachineError),

    #[error("can't create resources without a job request")]
    MissingRequest,

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("notification channel closed")]
    NotifyClosed,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
