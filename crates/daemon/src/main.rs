// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vattid: the job-orchestration daemon.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vatti_adapters::gcs::TokenSource;
use vatti_adapters::{GcsClient, GoogleHandlerFactory, PlatformClient};
use vatti_core::{HandlerFactory, Settings, SettingsError};
use vatti_daemon::Scheduler;
use vatti_store::{JobStore, StoreError};

#[derive(Debug, thiserror::Error)]
enum DaemonError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scheduler(#[from] vatti_daemon::SchedulerError),
}

async fn run() -> Result<(), DaemonError> {
    let settings = Arc::new(Settings::from_env()?);
    info!(
        namespace = %settings.namespace,
        db = %settings.db_path.display(),
        "starting vattid"
    );

    let gcs = GcsClient::new(settings.gcp_project.clone(), TokenSource::metadata());
    let platform = PlatformClient::new(&settings);
    let factory: Arc<dyn HandlerFactory> = Arc::new(GoogleHandlerFactory::new(
        Arc::clone(&settings),
        gcs.clone(),
    ));

    // create the job database if it does not exist
    let store = Arc::new(JobStore::new(&settings.db_path, Arc::clone(&factory)));
    store.create()?;

    let (notify_tx, notify_rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(store, factory, platform, gcs, settings, notify_tx, notify_rx);
    scheduler.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "vattid exiting");
        std::process::exit(1);
    }
}
