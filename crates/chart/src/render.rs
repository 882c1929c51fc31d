// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Values rendering: launch request + settings → chart values.

use tracing::debug;

use vatti_core::{JobRequest, Settings, TargetGenome};

use crate::values::{
    CalculatorValues, ChartValues, KeyHandlerSecret, NextflowValues, RenderError, SecretValues,
};

/// Render the values document for one job.
///
/// Target-genome paths are rewritten to `gs://{work_bucket}/data/{original}`
/// before rendering; the result is validated before it is returned, so a
/// document that reaches the caller is safe to hand to the chart.
pub fn render_values(
    request: &JobRequest,
    work_bucket: &str,
    results_bucket: &str,
    settings: &Settings,
) -> Result<ChartValues, RenderError> {
    debug!(id = %request.id(), work_bucket, results_bucket, "rendering chart values");

    let input: Vec<TargetGenome> = request
        .pipeline_param
        .target_genomes
        .iter()
        .map(|genome| add_bucket_path(genome, work_bucket))
        .collect();

    let params = &request.pipeline_param.nxf_params_file;
    let values = ChartValues {
        secrets: SecretValues {
            tower_token: settings.tower_token.clone(),
            globus_domain: settings.globus_domain.clone(),
            globus_client_id: settings.globus_client_id.clone(),
            globus_client_secret: settings.globus_client_secret.clone(),
            globus_scopes: settings.globus_scopes.clone(),
            key_handler_token: settings.key_handler_token.clone(),
            key_handler_url: settings.key_handler_url.clone(),
            key_handler_password: settings.key_handler_password.clone(),
        },
        nxf_params: NextflowValues {
            gcp_project: settings.gcp_project.clone(),
            location: settings.gcp_location.clone(),
            work_bucket_path: format!("gs://{work_bucket}/work"),
        },
        job_params: CalculatorValues {
            min_overlap: settings.min_overlap,
            pgs_id: params.pgs_id.clone(),
            pgp_id: params.pgp_id.clone(),
            trait_efo: params.trait_efo.clone(),
            target_build: params.target_build,
            format: params.format,
            outdir: format!("gs://{results_bucket}/results"),
        },
        key_handler_secret: KeyHandlerSecret {
            secret_id: request
                .secret_key_details
                .secret_id
                .to_string()
                .to_uppercase(),
            secret_id_version: request.secret_key_details.secret_id_version.clone(),
        },
        input,
    };

    values.validate()?;
    Ok(values)
}

/// Rewrite a genome's paths to their staged location under the work bucket.
fn add_bucket_path(genome: &TargetGenome, work_bucket: &str) -> TargetGenome {
    let staged = |path: &str| format!("gs://{work_bucket}/data/{path}");
    TargetGenome {
        sampleset: genome.sampleset.clone(),
        chrom: genome.chrom.clone(),
        vcf_import_dosage: genome.vcf_import_dosage,
        geno: staged(&genome.geno),
        pheno: staged(&genome.pheno),
        variants: staged(&genome.variants),
        format: genome.format,
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
