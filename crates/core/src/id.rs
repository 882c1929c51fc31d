// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifiers.
//!
//! Ids arrive in launch messages and must match the `INTP…` pattern. The
//! lowercased form doubles as the chart release name and as the stem for the
//! per-job bucket names, so it is computed once and cached here.

use serde::{Deserialize, Serialize};

/// Prefix every job id must carry.
pub const ID_PREFIX: &str = "INTP";

/// An opaque job identifier (e.g. `INTP12345678`).
///
/// Used as the primary key in the job store and, lowercased, to derive
/// cluster-side resource names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Parse an id, rejecting strings without the `INTP` prefix.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if !id.starts_with(ID_PREFIX) {
            return Err(IdError::BadPrefix(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased id: the chart release name and bucket-name stem.
    pub fn release_name(&self) -> String {
        self.0.to_lowercase()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        JobId::new(s).map_err(serde::de::Error::custom)
    }
}

/// Errors parsing a job id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("job id must start with {ID_PREFIX}, got {0:?}")]
    BadPrefix(String),
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
