// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The main loop.
//!
//! Ticks once per second. On each tick it restarts any bus worker that
//! flagged itself not-ok (counting the failures), then runs whichever
//! periodic tasks are due: the two timeout sweeps, the platform poll, and
//! the bucket GC.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use vatti_adapters::{gc, GcsClient, PlatformClient};
use vatti_core::{HandlerFactory, NotifySender, Settings, StatusMessage};
use vatti_store::JobStore;

use crate::bus::{consumer, producer};
use crate::monitor;
use crate::supervise::WorkerHealth;

const TICK: Duration = Duration::from_secs(1);
const TIMEOUT_SWEEP_PERIOD: Duration = Duration::from_secs(60);
const GC_PERIOD: Duration = Duration::from_secs(60 * 60);

/// A task that runs once per period, aligned to the scheduler's ticks.
#[derive(Debug)]
pub(crate) struct Periodic {
    every: Duration,
    last: Instant,
}

impl Periodic {
    pub(crate) fn new(every: Duration) -> Self {
        Self {
            every,
            last: Instant::now(),
        }
    }

    pub(crate) fn due(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last) >= self.every {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Owns the workers and drives the periodic sweeps.
pub struct Scheduler {
    store: Arc<JobStore>,
    factory: Arc<dyn HandlerFactory>,
    platform: PlatformClient,
    gcs: GcsClient,
    settings: Arc<Settings>,
    notify: NotifySender,
    outbound: producer::SharedReceiver,
    consumer_health: Arc<WorkerHealth>,
    producer_health: Arc<WorkerHealth>,
}

impl Scheduler {
    pub fn new(
        store: Arc<JobStore>,
        factory: Arc<dyn HandlerFactory>,
        platform: PlatformClient,
        gcs: GcsClient,
        settings: Arc<Settings>,
        notify: NotifySender,
        outbound: mpsc::UnboundedReceiver<StatusMessage>,
    ) -> Self {
        Self {
            store,
            factory,
            platform,
            gcs,
            settings,
            notify,
            outbound: Arc::new(tokio::sync::Mutex::new(outbound)),
            consumer_health: Arc::new(WorkerHealth::new()),
            producer_health: Arc::new(WorkerHealth::new()),
        }
    }

    fn spawn_consumer(&self) {
        let ctx = consumer::ConsumerCtx {
            store: Arc::clone(&self.store),
            factory: Arc::clone(&self.factory),
            notify: self.notify.clone(),
            settings: Arc::clone(&self.settings),
            health: Arc::clone(&self.consumer_health),
        };
        tokio::spawn(consumer::run(ctx));
    }

    fn spawn_producer(&self) {
        tokio::spawn(producer::run(
            Arc::clone(&self.outbound),
            Arc::clone(&self.settings),
            Arc::clone(&self.producer_health),
        ));
    }

    /// Run until the bus fails more times than the configured tolerance.
    pub async fn run(self) -> Result<(), SchedulerError> {
        self.spawn_consumer();
        self.spawn_producer();

        let mut undeployed_sweep = Periodic::new(TIMEOUT_SWEEP_PERIOD);
        let mut deployed_sweep = Periodic::new(TIMEOUT_SWEEP_PERIOD);
        let mut poll = Periodic::new(Duration::from_secs(self.settings.poll_interval));
        let mut bucket_gc = Periodic::new(GC_PERIOD);
        let gc_prefix = format!("{}-intp", self.settings.namespace.as_str());

        let mut bus_failures: u32 = 0;
        let mut ticks = tokio::time::interval(TICK);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            let now = Instant::now();

            if !self.consumer_health.is_ok() {
                bus_failures += 1;
                warn!(bus_failures, "consumer not ok, restarting");
                if bus_failures > self.settings.max_bus_failures {
                    return Err(SchedulerError::TooManyBusFailures { count: bus_failures });
                }
                self.consumer_health.reset();
                self.spawn_consumer();
            }
            if !self.producer_health.is_ok() {
                bus_failures += 1;
                warn!(bus_failures, "producer not ok, restarting");
                if bus_failures > self.settings.max_bus_failures {
                    return Err(SchedulerError::TooManyBusFailures { count: bus_failures });
                }
                self.producer_health.reset();
                self.spawn_producer();
            }

            if undeployed_sweep.due(now) {
                info!("checking for timed out jobs");
                if let Err(err) = self
                    .store
                    .timeout_jobs(self.settings.timeout_seconds, &self.notify)
                    .await
                {
                    error!(error = %err, "timeout sweep failed");
                }
            }

            if deployed_sweep.due(now) {
                info!("checking deployed jobs for timeout");
                if let Err(err) = self
                    .store
                    .timeout_deployed_jobs(self.settings.deployed_timeout_seconds, &self.notify)
                    .await
                {
                    error!(error = %err, "deployed timeout sweep failed");
                }
            }

            if poll.due(now) {
                if let Err(err) = monitor::poll_and_update(
                    &self.store,
                    &self.platform,
                    self.settings.namespace,
                    &self.notify,
                )
                .await
                {
                    error!(error = %err, "poll and update failed");
                }
            }

            if bucket_gc.due(now) {
                info!(prefix = %gc_prefix, "running bucket clean up");
                if let Err(err) = gc::bucket_clean_up(&self.gcs, &gc_prefix).await {
                    error!(error = %err, "bucket clean up failed");
                }
            }
        }
    }
}

/// Unrecoverable scheduler faults; the process exits on these.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("bus failed {count} times, giving up")]
    TooManyBusFailures { count: u32 },
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
