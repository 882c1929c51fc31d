// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification bridge: platform status → state machine triggers.
//!
//! Runs once per poll tick. For every active job the platform is asked for
//! the latest workflow log; when the remote state differs from the stored
//! one, the matching trigger is fired and the row re-persisted. The bridge
//! never publishes notifications itself; the machine's `notify` hook does.

use tracing::{info, warn};

use vatti_adapters::PlatformClient;
use vatti_core::{JobState, Namespace, NotifySender, Trigger};
use vatti_store::{JobStore, StoreError};

/// Poll the platform and advance any jobs whose remote state moved.
pub async fn poll_and_update(
    store: &JobStore,
    platform: &PlatformClient,
    namespace: Namespace,
    notify: &NotifySender,
) -> Result<(), StoreError> {
    let jobs = store.active_jobs()?;
    if jobs.is_empty() {
        return Ok(());
    }
    info!(count = jobs.len(), "active jobs found");

    for mut job in jobs {
        info!(id = %job.id(), state = %job.state(), "checking job state");
        let search = format!("{}-{}", namespace.as_str(), job.id());
        let log = match platform.workflow_log(&search).await {
            Ok(log) => log,
            Err(err) => {
                warn!(id = %job.id(), error = %err, "platform query failed, skipping this tick");
                continue;
            }
        };
        let Some(log) = log else {
            continue;
        };
        let Some(target) = log.job_state() else {
            continue;
        };
        if target == job.state() {
            continue;
        }
        info!(id = %job.id(), from = %job.state(), to = %target, "job state change detected");

        let Some(trigger) = Trigger::for_target(target) else {
            continue;
        };
        if target == JobState::Failed {
            job.set_trace(log.error_report.clone(), log.exit_status);
        }
        if let Err(err) = job.trigger(trigger, notify, None).await {
            // the remote state raced ahead of ours; the next tick reconciles
            warn!(id = %job.id(), error = %err, "couldn't apply remote state, skipping job");
            continue;
        }
        store.update(&job)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
