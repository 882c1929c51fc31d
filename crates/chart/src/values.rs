// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed form of the chart's values document.
//!
//! The rendered document is the trust boundary between the launch message
//! and the cluster: [`ChartValues::validate`] re-checks the rendered paths
//! independently of the request validation that ran before the rewrite.

use serde::{Deserialize, Serialize};

use vatti_core::{GenomeBuild, SamplesheetFormat, TargetGenome};

/// Secrets templated into the chart from settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretValues {
    pub tower_token: String,
    pub globus_domain: String,
    pub globus_client_id: String,
    pub globus_client_secret: String,
    pub globus_scopes: String,
    pub key_handler_token: String,
    pub key_handler_url: String,
    pub key_handler_password: String,
}

/// Nextflow configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextflowValues {
    pub gcp_project: String,
    pub location: String,
    /// `gs://{work_bucket}/work`
    pub work_bucket_path: String,
}

/// Per-run calculator parameters.
///
/// Keys stay snake_case: they are handed to the workflow as a params file,
/// not interpolated by the chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorValues {
    pub min_overlap: f64,
    pub pgs_id: Option<String>,
    pub pgp_id: Option<String>,
    pub trait_efo: Option<String>,
    pub target_build: GenomeBuild,
    pub format: SamplesheetFormat,
    /// `gs://{results_bucket}/results`
    pub outdir: String,
}

/// Key-handler secret reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyHandlerSecret {
    /// Uppercased UUID of the secret key.
    pub secret_id: String,
    pub secret_id_version: String,
}

/// The complete rendered values document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartValues {
    pub secrets: SecretValues,
    pub nxf_params: NextflowValues,
    pub job_params: CalculatorValues,
    pub key_handler_secret: KeyHandlerSecret,
    /// Target genomes with paths rewritten under the work bucket.
    pub input: Vec<TargetGenome>,
}

impl ChartValues {
    /// Re-validate the rendered document.
    pub fn validate(&self) -> Result<(), RenderError> {
        check_bucket_path(&self.nxf_params.work_bucket_path)?;
        check_bucket_path(&self.job_params.outdir)?;
        if !(0.0..=1.0).contains(&self.job_params.min_overlap) {
            return Err(RenderError::Overlap(self.job_params.min_overlap));
        }
        for genome in &self.input {
            for path in genome.paths() {
                check_bucket_path(path)?;
                if path.ends_with(".c4gh") {
                    return Err(RenderError::EncryptedPath(path.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Serialize for `helm install -f`.
    pub fn to_yaml(&self) -> Result<String, RenderError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn check_bucket_path(path: &str) -> Result<(), RenderError> {
    if path.starts_with("gs://") {
        Ok(())
    } else {
        Err(RenderError::BadBucketPath(path.to_string()))
    }
}

/// Errors rendering or validating chart values.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("bucket path {0:?} doesn't start with gs://")]
    BadBucketPath(String),

    #[error("rendered path {0:?} still looks encrypted")]
    EncryptedPath(String),

    #[error("min_overlap {0} is not within [0, 1]")]
    Overlap(f64),

    #[error("could not serialize values: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
#[path = "values_tests.rs"]
mod tests;
