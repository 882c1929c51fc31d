// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status-topic producer.
//!
//! Drains the shared notification channel and publishes each message as
//! UTF-8 JSON. The receiver lives behind a mutex so a restarted producer
//! task can pick up where the dead one stopped.

use std::sync::Arc;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

use vatti_core::{Settings, StatusMessage};

use super::BusError;
use crate::supervise::WorkerHealth;

/// Receiving half of the notification channel, shared across restarts.
pub type SharedReceiver = Arc<Mutex<mpsc::UnboundedReceiver<StatusMessage>>>;

fn build_producer(settings: &Settings) -> Result<FutureProducer, BusError> {
    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &settings.bus.bootstrap)
        .set("message.timeout.ms", "5000")
        .create()?;
    Ok(producer)
}

/// Run the producer until the bus fails or the channel closes.
pub async fn run(rx: SharedReceiver, settings: Arc<Settings>, health: Arc<WorkerHealth>) {
    let producer = match build_producer(&settings) {
        Ok(producer) => producer,
        Err(err) => {
            error!(error = %err, "couldn't build bus producer");
            health.report_failure();
            return;
        }
    };

    let mut rx = rx.lock().await;
    loop {
        let Some(message) = rx.recv().await else {
            info!("notification channel closed, producer exiting");
            return;
        };
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, "couldn't serialize status message");
                continue;
            }
        };
        let record = FutureRecord::to(&settings.bus.producer_topic)
            .payload(&payload)
            .key(message.run_name.as_str());
        match producer.send(record, Duration::from_secs(5)).await {
            Ok(_) => {
                info!(
                    run_name = %message.run_name,
                    event = %message.event,
                    topic = %settings.bus.producer_topic,
                    "status message sent"
                );
            }
            Err((err, _)) => {
                error!(error = %err, "bus write failed");
                health.report_failure();
                return;
            }
        }
    }
}
