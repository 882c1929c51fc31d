// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker supervision flags.
//!
//! Each bus worker owns one [`WorkerHealth`]; it flips the flag on an
//! unrecoverable bus error just before exiting. The scheduler reads the
//! flag on its tick, restarts the worker, and counts the failure.

use std::sync::atomic::{AtomicBool, Ordering};

/// A single-writer not-ok signal between a worker and the scheduler.
#[derive(Debug)]
pub struct WorkerHealth {
    ok: AtomicBool,
}

impl WorkerHealth {
    pub fn new() -> Self {
        Self {
            ok: AtomicBool::new(true),
        }
    }

    /// Called by the worker when it gives up.
    pub fn report_failure(&self) {
        self.ok.store(false, Ordering::SeqCst);
    }

    pub fn is_ok(&self) -> bool {
        self.ok.load(Ordering::SeqCst)
    }

    /// Called by the scheduler after it has restarted the worker.
    pub fn reset(&self) {
        self.ok.store(true, Ordering::SeqCst);
    }
}

impl Default for WorkerHealth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "supervise_tests.rs"]
mod tests;
