// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;

use mockito::Matcher;
use tokio::sync::mpsc;
use vatti_core::{Job, JobId, NoopHandler, NoopHandlerFactory, StatusMessage};

fn store(dir: &tempfile::TempDir) -> JobStore {
    let store = JobStore::new(dir.path().join("jobs.db"), Arc::new(NoopHandlerFactory));
    store.create().unwrap();
    store
}

fn insert(store: &JobStore, id: &str, state: JobState) {
    let job = Job::with_handler(
        JobId::new(id).unwrap(),
        Box::new(NoopHandler::default()),
        state,
    );
    store.insert(&job).unwrap();
}

fn page(status: &str, error_report: Option<&str>) -> String {
    let mut workflow = serde_json::json!({
        "runName": "intervene-dev-intptest01",
        "start": "2024-05-01T12:00:00Z",
        "status": status
    });
    if let Some(report) = error_report {
        workflow["errorReport"] = report.into();
        workflow["exitStatus"] = 12.into();
    }
    serde_json::json!({"workflows": [{"workflow": workflow}], "totalSize": 1}).to_string()
}

async fn poll(
    store: &JobStore,
    server: &mockito::Server,
) -> mpsc::UnboundedReceiver<StatusMessage> {
    let (tx, rx) = mpsc::unbounded_channel();
    let platform = PlatformClient::with_root(server.url(), "token", "000000");
    poll_and_update(store, &platform, Namespace::Dev, &tx).await.unwrap();
    rx
}

#[tokio::test]
async fn running_workflow_deploys_a_created_job() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    insert(&store, "INTPTEST01", JobState::Created);

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/workflow")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("workspaceId".into(), "000000".into()),
            Matcher::UrlEncoded("search".into(), "intervene-dev-INTPTEST01".into()),
            Matcher::UrlEncoded("max".into(), "1".into()),
        ]))
        .with_body(page("RUNNING", None))
        .create_async()
        .await;

    let mut rx = poll(&store, &server).await;

    assert_eq!(
        store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Deployed
    );
    let msg = rx.try_recv().unwrap();
    assert_eq!(msg.event, JobState::Deployed);
    mock.assert_async().await;
}

#[tokio::test]
async fn succeeded_workflow_completes_a_deployed_job() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    insert(&store, "INTPTEST01", JobState::Deployed);

    let mut server = mockito::Server::new_async().await;
    let _m1 = server
        .mock("GET", "/workflow")
        .match_query(Matcher::Any)
        .with_body(page("SUCCEEDED", None))
        .create_async()
        .await;

    let mut rx = poll(&store, &server).await;

    assert_eq!(
        store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Succeeded
    );
    assert_eq!(rx.try_recv().unwrap().event, JobState::Succeeded);
}

#[tokio::test]
async fn failed_workflow_captures_the_trace_before_erroring() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    insert(&store, "INTPTEST01", JobState::Deployed);

    let mut server = mockito::Server::new_async().await;
    let _m1 = server
        .mock("GET", "/workflow")
        .match_query(Matcher::Any)
        .with_body(page("FAILED", Some("Error executing process > 'X'\nstack...")))
        .create_async()
        .await;

    let mut rx = poll(&store, &server).await;

    let job = store.load("INTPTEST01").unwrap().unwrap();
    assert_eq!(job.state(), JobState::Failed);
    assert_eq!(job.trace_name(), Some("Error executing process > 'X'"));
    assert_eq!(job.trace_exit(), Some(12));

    let msg = rx.try_recv().unwrap();
    assert_eq!(msg.event, JobState::Failed);
    assert_eq!(msg.trace_name.as_deref(), Some("Error executing process > 'X'"));
    assert_eq!(msg.trace_exit, Some(12));
}

#[tokio::test]
async fn unchanged_remote_state_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    insert(&store, "INTPTEST01", JobState::Deployed);

    let mut server = mockito::Server::new_async().await;
    let _m1 = server
        .mock("GET", "/workflow")
        .match_query(Matcher::Any)
        .with_body(page("RUNNING", None))
        .create_async()
        .await;

    let mut rx = poll(&store, &server).await;
    assert_eq!(
        store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Deployed
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn workflow_not_started_yet_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    insert(&store, "INTPTEST01", JobState::Created);

    let mut server = mockito::Server::new_async().await;
    let _m1 = server
        .mock("GET", "/workflow")
        .match_query(Matcher::Any)
        .with_body(serde_json::json!({"workflows": [], "totalSize": 0}).to_string())
        .create_async()
        .await;

    let mut rx = poll(&store, &server).await;
    assert_eq!(
        store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Created
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn illegal_remote_transition_skips_the_job() {
    // remote says Succeeded but the job never deployed: succeed is illegal
    // from Created, the job is left alone for the next tick
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    insert(&store, "INTPTEST01", JobState::Created);

    let mut server = mockito::Server::new_async().await;
    let _m1 = server
        .mock("GET", "/workflow")
        .match_query(Matcher::Any)
        .with_body(page("SUCCEEDED", None))
        .create_async()
        .await;

    let mut rx = poll(&store, &server).await;
    assert_eq!(
        store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Created
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn platform_errors_do_not_kill_the_tick() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    insert(&store, "INTPTEST01", JobState::Created);

    let mut server = mockito::Server::new_async().await;
    let _m1 = server
        .mock("GET", "/workflow")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let mut rx = poll(&store, &server).await;
    assert_eq!(
        store.load("INTPTEST01").unwrap().unwrap().state(),
        JobState::Created
    );
    assert!(rx.try_recv().is_err());
}
