// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vatti-store: durable persistence for job state machines.
//!
//! One SQLite file, one table. Each job row carries the serialized machine
//! record plus a denormalized `state` column for sweeps; an update trigger
//! keeps `updated_at` fresh.

mod store;

pub use store::{JobStore, StoreError};
