// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two bus workers: launch-message consumer and status producer.

pub mod consumer;
pub mod producer;

/// Errors configuring a bus client.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("bus client configuration failed: {0}")]
    Config(#[from] rdkafka::error::KafkaError),
}
