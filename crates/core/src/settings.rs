// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only configuration snapshot, loaded once from the environment.

use std::path::PathBuf;

/// Kubernetes namespace the chart releases deploy into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Dev,
    Test,
    Prod,
}

crate::simple_display! {
    Namespace {
        Dev => "intervene-dev",
        Test => "intervene-test",
        Prod => "intervene-prod",
    }
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Dev => "intervene-dev",
            Namespace::Test => "intervene-test",
            Namespace::Prod => "intervene-prod",
        }
    }
}

impl std::str::FromStr for Namespace {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intervene-dev" => Ok(Namespace::Dev),
            "intervene-test" => Ok(Namespace::Test),
            "intervene-prod" => Ok(Namespace::Prod),
            other => Err(SettingsError::Invalid {
                var: "NAMESPACE",
                reason: format!("unknown namespace {other:?}"),
            }),
        }
    }
}

/// Message-bus endpoints and topics.
#[derive(Debug, Clone)]
pub struct BusSettings {
    /// Bootstrap server, `host:port`.
    pub bootstrap: String,
    /// Launch topic read by the consumer.
    pub consumer_topic: String,
    /// Status topic written by the producer.
    pub producer_topic: String,
    /// Consumer group id.
    pub group_id: String,
}

/// Immutable settings snapshot.
///
/// Created once in `main`, then passed by reference into the scheduler,
/// workers, and resource handler. Never mutated.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path to the workflow chart directory.
    pub chart_path: PathBuf,
    /// Cluster namespace to deploy resources into.
    pub namespace: Namespace,
    pub bus: BusSettings,
    /// Seqera platform token.
    pub tower_token: String,
    /// Seqera platform workspace id.
    pub tower_workspace: String,
    /// Seqera platform API root.
    pub tower_api_url: String,
    /// Google Cloud project id.
    pub gcp_project: String,
    /// Location to request cloud resources from.
    pub gcp_location: String,
    /// Minimum variant overlap for the calculation workflow.
    pub min_overlap: f64,
    /// Seconds between platform API polls.
    pub poll_interval: u64,
    /// Seconds before an undeployed (Requested/Created) job is failed.
    pub timeout_seconds: u64,
    /// Seconds before a Deployed job is failed.
    pub deployed_timeout_seconds: u64,
    /// Path to the SQLite job database.
    pub db_path: PathBuf,
    /// Back-pressure limit for the consumer.
    pub max_concurrent_jobs: usize,
    /// Worker restarts tolerated before the process exits.
    pub max_bus_failures: u32,
    pub globus_domain: String,
    pub globus_client_id: String,
    pub globus_client_secret: String,
    pub globus_scopes: String,
    pub key_handler_token: String,
    pub key_handler_url: String,
    pub key_handler_password: String,
}

impl Settings {
    /// Load the snapshot from environment variables.
    ///
    /// Fails with the offending variable name on anything missing or out of
    /// range, so a bad deployment dies at startup rather than mid-sweep.
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = Self {
            chart_path: PathBuf::from(require("HELM_CHART_PATH")?),
            namespace: optional("NAMESPACE")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(Namespace::Dev),
            bus: BusSettings {
                bootstrap: require("KAFKA_BOOTSTRAP_SERVER")?,
                consumer_topic: optional("KAFKA_CONSUMER_TOPIC")
                    .unwrap_or_else(|| "pipeline-launch".to_string()),
                producer_topic: optional("KAFKA_PRODUCER_TOPIC")
                    .unwrap_or_else(|| "pipeline-status".to_string()),
                group_id: optional("KAFKA_GROUP_ID").unwrap_or_else(|| "vatti".to_string()),
            },
            tower_token: require("TOWER_TOKEN")?,
            tower_workspace: require("TOWER_WORKSPACE")?,
            tower_api_url: optional("TOWER_API_URL")
                .unwrap_or_else(|| "https://api.cloud.seqera.io".to_string()),
            gcp_project: require("GCP_PROJECT")?,
            gcp_location: require("GCP_LOCATION")?,
            min_overlap: parse_or("MIN_OVERLAP", 0.75)?,
            poll_interval: parse_or("POLL_INTERVAL", 60)?,
            timeout_seconds: parse_or("TIMEOUT_SECONDS", 60 * 60 * 24)?,
            deployed_timeout_seconds: parse_or("DEPLOYED_TIMEOUT_SECONDS", 60 * 60 * 48)?,
            db_path: PathBuf::from(optional("SQLITE_DB_PATH").unwrap_or_else(|| "vatti.db".into())),
            max_concurrent_jobs: parse_or("MAX_CONCURRENT_JOBS", 10)?,
            max_bus_failures: parse_or("MAX_BUS_FAILS", 5)?,
            globus_domain: require("GLOBUS_DOMAIN")?,
            globus_client_id: require("GLOBUS_CLIENT_ID")?,
            globus_client_secret: require("GLOBUS_CLIENT_SECRET")?,
            globus_scopes: require("GLOBUS_SCOPES")?,
            key_handler_token: require("KEY_HANDLER_TOKEN")?,
            key_handler_url: require("KEY_HANDLER_URL")?,
            key_handler_password: require("KEY_HANDLER_PASSWORD")?,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.min_overlap) {
            return Err(SettingsError::Invalid {
                var: "MIN_OVERLAP",
                reason: format!("{} is not within [0, 1]", self.min_overlap),
            });
        }
        for (var, value) in [
            ("POLL_INTERVAL", self.poll_interval),
            ("TIMEOUT_SECONDS", self.timeout_seconds),
            ("DEPLOYED_TIMEOUT_SECONDS", self.deployed_timeout_seconds),
            ("MAX_CONCURRENT_JOBS", self.max_concurrent_jobs as u64),
        ] {
            if value == 0 {
                return Err(SettingsError::Invalid {
                    var,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn require(var: &'static str) -> Result<String, SettingsError> {
    std::env::var(var).map_err(|_| SettingsError::Missing(var))
}

fn optional(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

fn parse_or<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, SettingsError> {
    match optional(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| SettingsError::Invalid {
            var,
            reason: format!("could not parse {raw:?}"),
        }),
    }
}

/// Errors loading settings from the environment.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
