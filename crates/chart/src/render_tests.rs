// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use vatti_core::test_support::job_request;
use vatti_core::Settings;

fn render() -> ChartValues {
    let request = job_request("INTPTEST01");
    let settings = Settings::for_tests();
    render_values(
        &request,
        "intervene-dev-intptest01-work",
        "intervene-dev-intptest01-results",
        &settings,
    )
    .unwrap()
}

#[test]
fn secrets_come_from_settings() {
    let values = render();
    assert_eq!(values.secrets.globus_client_secret, "globus-secret");
    assert_eq!(values.secrets.globus_domain, "https://example.com");
    assert_eq!(values.secrets.tower_token, "test");
    assert_eq!(values.secrets.key_handler_url, "https://keys.example.com");
}

#[test]
fn nextflow_params_are_set() {
    let values = render();
    assert_eq!(values.nxf_params.gcp_project, "testproject");
    assert_eq!(values.nxf_params.location, "europe-west2");
    assert_eq!(
        values.nxf_params.work_bucket_path,
        "gs://intervene-dev-intptest01-work/work"
    );
}

#[test]
fn outdir_is_rooted_under_results() {
    let values = render();
    assert_eq!(
        values.job_params.outdir,
        "gs://intervene-dev-intptest01-results/results"
    );
}

#[test]
fn genome_paths_are_rewritten_under_data() {
    let values = render();
    let genome = &values.input[0];
    assert_eq!(
        genome.geno,
        "gs://intervene-dev-intptest01-work/data/hapnest.pgen"
    );
    assert_eq!(
        genome.pheno,
        "gs://intervene-dev-intptest01-work/data/hapnest.psam"
    );
    assert_eq!(
        genome.variants,
        "gs://intervene-dev-intptest01-work/data/hapnest.pvar"
    );
    // metadata is untouched by the rewrite
    assert_eq!(genome.sampleset, "hapnest");
}

#[test]
fn secret_id_is_uppercased() {
    let values = render();
    assert_eq!(
        values.key_handler_secret.secret_id,
        "81D5C400-21B4-4E88-8208-8D64C9920283"
    );
    assert_eq!(values.key_handler_secret.secret_id_version, "1");
}

#[test]
fn min_overlap_comes_from_settings() {
    let values = render();
    assert!((values.job_params.min_overlap - 0.75).abs() < f64::EPSILON);
}

#[test]
fn scoring_ids_are_carried_through() {
    let values = render();
    assert_eq!(values.job_params.pgs_id.as_deref(), Some("PGS000001"));
    assert_eq!(values.job_params.pgp_id, None);
    assert_eq!(values.job_params.trait_efo, None);
}
