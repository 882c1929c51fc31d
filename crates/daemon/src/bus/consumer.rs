// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch-topic consumer.
//!
//! Blocking iteration with manual commits. Whatever happens to a message
//! (accepted, malformed, invalid, or broken downstream) its offset is
//! committed exactly once, so nothing is retried forever and nothing is
//! processed twice on the successful path.

use std::sync::Arc;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{error, info, warn};

use vatti_core::{
    HandlerFactory, HandlerFlags, Job, JobRequest, NotifySender, Settings, Trigger,
};
use vatti_store::JobStore;

use super::BusError;
use crate::supervise::WorkerHealth;

/// Everything the consumer loop needs, cheap to clone per restart.
#[derive(Clone)]
pub struct ConsumerCtx {
    pub store: Arc<JobStore>,
    pub factory: Arc<dyn HandlerFactory>,
    pub notify: NotifySender,
    pub settings: Arc<Settings>,
    pub health: Arc<WorkerHealth>,
}

fn build_consumer(settings: &Settings) -> Result<StreamConsumer, BusError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("group.id", &settings.bus.group_id)
        .set("bootstrap.servers", &settings.bus.bootstrap)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .create()?;
    Ok(consumer)
}

/// Run the consumer until the bus fails.
///
/// Exits (after flagging not-ok) on any unrecoverable bus error; the
/// scheduler restarts it.
pub async fn run(ctx: ConsumerCtx) {
    let consumer = match build_consumer(&ctx.settings) {
        Ok(consumer) => consumer,
        Err(err) => {
            error!(error = %err, "couldn't build bus consumer");
            ctx.health.report_failure();
            return;
        }
    };
    if let Err(err) = consumer.subscribe(&[ctx.settings.bus.consumer_topic.as_str()]) {
        error!(error = %err, "couldn't subscribe to launch topic");
        ctx.health.report_failure();
        return;
    }
    info!(topic = %ctx.settings.bus.consumer_topic, "listening for bus messages");

    loop {
        let message = match consumer.recv().await {
            Ok(message) => message,
            Err(err) => {
                error!(error = %err, "bus read failed");
                ctx.health.report_failure();
                return;
            }
        };
        info!("message read from bus consumer");

        wait_for_capacity(&ctx).await;
        process_message(
            message.payload().unwrap_or_default(),
            &ctx.store,
            ctx.factory.as_ref(),
            &ctx.notify,
        )
        .await;

        // committed whether the message was accepted or rejected
        if let Err(err) = consumer.commit_message(&message, CommitMode::Sync) {
            error!(error = %err, "offset commit failed");
            ctx.health.report_failure();
            return;
        }
    }
}

/// Block while the active-job count is at the cap.
async fn wait_for_capacity(ctx: &ConsumerCtx) {
    loop {
        match ctx.store.active_count() {
            Ok(count) if count >= ctx.settings.max_concurrent_jobs => {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Ok(_) => return,
            Err(err) => {
                error!(error = %err, "couldn't count active jobs");
                return;
            }
        }
    }
}

/// Validate one payload, provision its job, and persist it.
///
/// Every failure is logged and swallowed: the caller commits the offset
/// regardless, discarding the message.
pub async fn process_message(
    payload: &[u8],
    store: &JobStore,
    factory: &dyn HandlerFactory,
    notify: &NotifySender,
) {
    let request = match JobRequest::from_slice(payload) {
        Ok(request) => request,
        Err(err) if err.is_decode() => {
            warn!(error = %err, "invalid JSON, skipping message");
            return;
        }
        Err(err) => {
            error!(error = %err, "job request message validation failed, skipping job");
            return;
        }
    };

    let id = request.id().clone();
    let mut job = Job::new(id.clone(), factory.handler(&id, HandlerFlags::default()));
    if let Err(err) = job.trigger(Trigger::Create, notify, Some(&request)).await {
        error!(id = %id, error = %err, "something went wildly wrong, skipping job");
        return;
    }
    if let Err(err) = store.insert(&job) {
        error!(id = %id, error = %err, "couldn't insert job");
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
