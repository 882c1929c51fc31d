// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end lifecycle scenarios over the machine, store, and renderer.
//!
//! The bus and the cloud are faked (scripted handlers, temp SQLite); the
//! monitor's HTTP path and the Google handler have their own crate-level
//! tests against a mock server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use tokio::sync::mpsc;
use vatti_core::test_support::{job_request, ScriptedHandlerFactory};
use vatti_core::{
    HandlerFactory, HandlerFlags, Job, JobState, NotifySender, RemoteLog, StatusMessage, Trigger,
    WorkflowPage,
};
use vatti_store::JobStore;

struct Harness {
    _dir: tempfile::TempDir,
    store: JobStore,
    factory: Arc<ScriptedHandlerFactory>,
    tx: NotifySender,
    rx: mpsc::UnboundedReceiver<StatusMessage>,
}

fn harness() -> Harness {
    harness_with(ScriptedHandlerFactory::new())
}

fn harness_with(factory: ScriptedHandlerFactory) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(factory);
    let shared: Arc<dyn HandlerFactory> = factory.clone();
    let store = JobStore::new(dir.path().join("jobs.db"), shared);
    store.create().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    Harness {
        _dir: dir,
        store,
        factory,
        tx,
        rx,
    }
}

fn backdate_hours(store: &JobStore, id: &str, hours: u32) {
    let conn = rusqlite::Connection::open(store.path()).unwrap();
    conn.execute(
        "UPDATE jobs SET created_at = datetime('now', ?1 || ' hours') WHERE id = ?2",
        (format!("-{hours}"), id),
    )
    .unwrap();
}

/// Scenario 1: launch → create → deploy → succeed.
#[tokio::test]
async fn happy_path() {
    let mut h = harness();
    let request = job_request("INTPTEST01");
    let id = request.id().clone();

    // the consumer: construct, create, insert
    let mut job = Job::new(id.clone(), h.factory.handler(&id, HandlerFlags::default()));
    job.trigger(Trigger::Create, &h.tx, Some(&request)).await.unwrap();
    h.store.insert(&job).unwrap();
    assert_eq!(
        h.store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Created
    );

    // poll cycle: platform reports Running
    let mut job = h.store.load("INTPTEST01").unwrap().unwrap();
    job.trigger(Trigger::Deploy, &h.tx, None).await.unwrap();
    h.store.update(&job).unwrap();
    let deployed = h.rx.try_recv().unwrap();
    assert_eq!(deployed.event, JobState::Deployed);
    assert_eq!(deployed.run_name, "INTPTEST01");

    // poll cycle: platform reports Succeeded
    let mut job = h.store.load("INTPTEST01").unwrap().unwrap();
    job.trigger(Trigger::Succeed, &h.tx, None).await.unwrap();
    h.store.update(&job).unwrap();
    assert_eq!(h.rx.try_recv().unwrap().event, JobState::Succeeded);
    assert_eq!(
        h.store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Succeeded
    );

    // destruction ran against the Succeeded state (results bucket retained
    // by the real handler in that state)
    assert_eq!(
        h.factory.log.lock().join(","),
        "create:INTPTEST01,destroy:Succeeded"
    );
    assert!(h.rx.try_recv().is_err());
}

/// Scenario 1b: the same launch message renders a complete values
/// document for the chart install.
#[test]
fn happy_path_message_renders_chart_values() {
    let request = job_request("INTPTEST01");
    let settings = vatti_core::Settings::for_tests();
    let values = vatti_chart::render_values(
        &request,
        "intervene-dev-intptest01-work",
        "intervene-dev-intptest01-results",
        &settings,
    )
    .unwrap();

    assert_eq!(values.job_params.pgs_id.as_deref(), Some("PGS000001"));
    assert_eq!(
        values.input[0].geno,
        "gs://intervene-dev-intptest01-work/data/hapnest.pgen"
    );
    let yaml = values.to_yaml().unwrap();
    assert!(yaml.contains("outdir: gs://intervene-dev-intptest01-results/results"));
}

/// Scenario 2: a message that fails validation creates nothing.
#[tokio::test]
async fn validation_failure_creates_nothing() {
    let h = harness();
    let mut message = serde_json::to_value(job_request("INTPTEST01")).unwrap();
    message["pipeline_param"]
        .as_object_mut()
        .unwrap()
        .remove("id");

    let err = vatti_core::JobRequest::from_slice(message.to_string().as_bytes()).unwrap_err();
    assert!(!err.is_decode());
    assert!(h.store.active_jobs().unwrap().is_empty());
    assert!(h.factory.log.lock().is_empty());
}

/// Scenario 3: error on a Succeeded job is a machine-error and a no-op.
#[tokio::test]
async fn illegal_transition_leaves_the_row_alone() {
    let mut h = harness();
    let request = job_request("INTPTEST01");
    let id = request.id().clone();
    let mut job = Job::new(id.clone(), h.factory.handler(&id, HandlerFlags::default()));
    job.trigger(Trigger::Create, &h.tx, Some(&request)).await.unwrap();
    job.trigger(Trigger::Deploy, &h.tx, None).await.unwrap();
    job.trigger(Trigger::Succeed, &h.tx, None).await.unwrap();
    h.store.insert(&job).unwrap();
    while h.rx.try_recv().is_ok() {}

    let mut job = h.store.load("INTPTEST01").unwrap().unwrap();
    let err = job.trigger(Trigger::Error, &h.tx, None).await.unwrap_err();
    assert!(matches!(err, vatti_core::JobError::Machine(_)));

    assert_eq!(
        h.store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Succeeded
    );
    assert!(h.rx.try_recv().is_err());
}

/// Scenario 4: a Requested job 25h old fails on the next sweep.
#[tokio::test]
async fn timeout_sweep_fails_stale_jobs() {
    let mut h = harness();
    let request = job_request("INTPTEST01");
    let id = request.id().clone();
    let job = Job::new(id.clone(), h.factory.handler(&id, HandlerFlags::default()));
    h.store.insert(&job).unwrap();
    backdate_hours(&h.store, "INTPTEST01", 25);

    h.store.timeout_jobs(3600, &h.tx).await.unwrap();

    let failed = h.store.load("INTPTEST01").unwrap().unwrap();
    assert_eq!(failed.state(), JobState::Failed);

    let msg = h.rx.try_recv().unwrap();
    assert_eq!(msg.event, JobState::Failed);
    assert_eq!(msg.run_name, "INTPTEST01");

    // destruction ran in the Failed state, which reclaims both buckets
    assert_eq!(h.factory.log.lock().join(","), "destroy:Failed");
}

/// Scenario 5: pre-existing work bucket fails the job without touching
/// the bucket.
#[tokio::test]
async fn pre_existing_bucket_fails_safely() {
    let mut factory = ScriptedHandlerFactory::new();
    factory.work_bucket_exists = true;
    let mut h = harness_with(factory);

    let request = job_request("INTPTEST01");
    let id = request.id().clone();
    let mut job = Job::new(id.clone(), h.factory.handler(&id, HandlerFlags::default()));
    // the exception policy recovers the failure into the Failed state
    job.trigger(Trigger::Create, &h.tx, Some(&request)).await.unwrap();
    h.store.insert(&job).unwrap();

    let stored = h.store.load("INTPTEST01").unwrap().unwrap();
    assert_eq!(stored.state(), JobState::Failed);
    assert!(stored.to_record().flags.work_bucket_existed_on_create);

    assert_eq!(h.rx.try_recv().unwrap().event, JobState::Failed);
}

/// Scenario 6: remote failure diagnostics flow into the notification.
#[tokio::test]
async fn remote_failure_carries_the_trace() {
    let mut h = harness();
    let request = job_request("INTPTEST01");
    let id = request.id().clone();
    let mut job = Job::new(id.clone(), h.factory.handler(&id, HandlerFlags::default()));
    job.trigger(Trigger::Create, &h.tx, Some(&request)).await.unwrap();
    job.trigger(Trigger::Deploy, &h.tx, None).await.unwrap();
    h.store.insert(&job).unwrap();
    while h.rx.try_recv().is_ok() {}

    // what the monitor sees from the platform
    let page: WorkflowPage = serde_json::from_value(serde_json::json!({
        "workflows": [{"workflow": {
            "runName": "intervene-dev-intptest01",
            "start": "2024-05-01T12:00:00Z",
            "status": "FAILED",
            "exitStatus": 12,
            "errorReport": "Error executing process > 'X'\nstack..."
        }}],
        "totalSize": 1
    }))
    .unwrap();
    let log = RemoteLog::from_page(page).unwrap();
    assert_eq!(log.job_state(), Some(JobState::Failed));

    let mut job = h.store.load("INTPTEST01").unwrap().unwrap();
    job.set_trace(log.error_report.clone(), log.exit_status);
    job.trigger(Trigger::Error, &h.tx, None).await.unwrap();
    h.store.update(&job).unwrap();

    let msg = h.rx.try_recv().unwrap();
    let wire: serde_json::Value = serde_json::to_value(&msg).unwrap();
    assert_eq!(wire["event"], "Failed");
    assert_eq!(wire["trace_name"], "Error executing process > 'X'");
    assert_eq!(wire["trace_exit"], 12);

    let stored = h.store.load("INTPTEST01").unwrap().unwrap();
    assert_eq!(stored.trace_name(), Some("Error executing process > 'X'"));
    assert_eq!(stored.trace_exit(), Some(12));
}
