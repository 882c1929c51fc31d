// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch-message models.
//!
//! A launch message is JSON read off the bus. Parsing and validation are
//! separate phases: [`JobRequest::from_slice`] first decodes the payload,
//! then runs the schema checks, so callers can tell malformed JSON apart
//! from a well-formed message that breaks a rule.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::JobId;

/// Supported target-genome container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// PLINK2 triplet (pgen/pvar/psam).
    Pfile,
    /// PLINK1 triplet (bed/bim/fam).
    Bfile,
    /// Single VCF, optionally bgzipped.
    Vcf,
}

crate::simple_display! {
    TargetFormat {
        Pfile => "pfile",
        Bfile => "bfile",
        Vcf => "vcf",
    }
}

/// Reference genome build of the target genomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenomeBuild {
    GRCh37,
    GRCh38,
}

/// Samplesheet format accepted by the workflow API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SamplesheetFormat {
    #[default]
    Json,
}

/// A file staged from Globus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobusFile {
    pub filename: String,
    /// Size in bytes, used to resume interrupted transfers.
    pub size: u64,
}

impl GlobusFile {
    fn validate(&self) -> Result<(), RequestError> {
        if !self.filename.ends_with(".c4gh") {
            return Err(RequestError::invalid(format!(
                "globus filename {:?} must end with .c4gh",
                self.filename
            )));
        }
        if self.size == 0 {
            return Err(RequestError::invalid(format!(
                "globus file {:?} has zero size",
                self.filename
            )));
        }
        Ok(())
    }
}

/// Details required to stage files from Globus for working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobusConfig {
    /// Globus path to the directory where the files are stored.
    pub dir_path_on_guest_collection: String,
    pub files: Vec<GlobusFile>,
}

impl GlobusConfig {
    fn validate(&self) -> Result<(), RequestError> {
        if self.files.is_empty() {
            return Err(RequestError::invalid("globus file list is empty"));
        }
        for file in &self.files {
            file.validate()?;
        }
        Ok(())
    }
}

/// A target genome: one or more genotype files plus metadata.
///
/// Genomes may be split by chromosome to speed up calculation on larger
/// datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGenome {
    /// Human label for a cohort / dataset.
    pub sampleset: String,
    /// Chromosome the variants belong to (None = multiple chromosomes).
    #[serde(default, deserialize_with = "string_or_number")]
    pub chrom: Option<String>,
    /// Import dosage data instead of hard genotypes.
    #[serde(default)]
    pub vcf_import_dosage: bool,
    /// Path to a genotype file (pgen / bed / vcf). Not a PathBuf: the
    /// rendered form carries a gs:// prefix.
    pub geno: String,
    /// Path to a phenotype file (psam / fam / vcf).
    pub pheno: String,
    /// Path to a variant information file (pvar / bim / vcf).
    pub variants: String,
    pub format: TargetFormat,
}

impl TargetGenome {
    pub fn paths(&self) -> [&str; 3] {
        [&self.geno, &self.pheno, &self.variants]
    }

    fn validate(&self) -> Result<(), RequestError> {
        if self.sampleset.contains('_') {
            return Err(RequestError::invalid("sampleset name can't contain _"));
        }
        if self.sampleset == "reference" {
            return Err(RequestError::invalid("sampleset name can't be reference"));
        }
        for path in self.paths() {
            if path.ends_with(".c4gh") {
                return Err(RequestError::invalid(format!(
                    "calculation workflow can't handle encrypted files: {path:?}"
                )));
            }
        }
        self.check_geno_suffix()?;
        self.check_pheno_suffix()?;
        self.check_variant_suffix()?;
        self.check_format_and_filenames()
    }

    fn check_geno_suffix(&self) -> Result<(), RequestError> {
        let suffixes = suffixes(&self.geno);
        match suffixes.last().map(String::as_str) {
            Some(".pgen" | ".bed") => Ok(()),
            Some(".gz") if suffixes.iter().any(|s| s == ".vcf") => Ok(()),
            Some(".vcf") => Ok(()),
            _ => Err(RequestError::invalid(format!(
                "genotype file {:?} is not a supported format",
                self.geno
            ))),
        }
    }

    fn check_pheno_suffix(&self) -> Result<(), RequestError> {
        let suffixes = suffixes(&self.pheno);
        match suffixes.last().map(String::as_str) {
            Some(".psam" | ".fam") => Ok(()),
            Some(".gz") if suffixes.iter().any(|s| s == ".vcf") => Ok(()),
            Some(".vcf") => Ok(()),
            _ => Err(RequestError::invalid(format!(
                "phenotype information file {:?} is not a supported format",
                self.pheno
            ))),
        }
    }

    fn check_variant_suffix(&self) -> Result<(), RequestError> {
        let suffixes = suffixes(&self.variants);
        match suffixes.last().map(String::as_str) {
            Some(".pvar" | ".bim") => Ok(()),
            Some(".zst")
                if suffixes.iter().any(|s| s == ".pvar") || suffixes.iter().any(|s| s == ".bim") =>
            {
                Ok(())
            }
            Some(".gz")
                if suffixes.iter().any(|s| s == ".bim") || suffixes.iter().any(|s| s == ".vcf") =>
            {
                Ok(())
            }
            Some(".vcf") => Ok(()),
            _ => Err(RequestError::invalid(format!(
                "variant information file {:?} is not a supported format",
                self.variants
            ))),
        }
    }

    /// The declared format must align with the combined file extensions.
    ///
    /// PLINK1/2 sets are a triplet of variant information file (text),
    /// genotype (binary), and sample information file (text); the variant
    /// file may be zstd-compressed. VCFs are a single file repeated three
    /// times, with optional bgzip compression.
    fn check_format_and_filenames(&self) -> Result<(), RequestError> {
        let mut extensions: Vec<String> = self.paths().iter().flat_map(|p| suffixes(p)).collect();
        extensions.sort();
        extensions.dedup();
        let set: Vec<&str> = extensions.iter().map(String::as_str).collect();

        let ok = match self.format {
            TargetFormat::Pfile => {
                set == [".pgen", ".psam", ".pvar"] || set == [".pgen", ".psam", ".pvar", ".zst"]
            }
            TargetFormat::Bfile => {
                set == [".bed", ".bim", ".fam"] || set == [".bed", ".bim", ".fam", ".zst"]
            }
            TargetFormat::Vcf => set == [".vcf"] || set == [".gz", ".vcf"],
        };
        if ok {
            Ok(())
        } else {
            Err(RequestError::invalid(format!(
                "invalid combination of format {} and file paths: {:?}",
                self.format,
                self.paths()
            )))
        }
    }
}

/// Runtime parameters for the scoring workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Comma-separated polygenic score identifiers (`PGS......`).
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub pgs_id: Option<String>,
    /// Comma-separated publication identifiers (`PGP......`).
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub pgp_id: Option<String>,
    /// Comma-separated experimental factor ontology traits.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub trait_efo: Option<String>,
    pub target_build: GenomeBuild,
    #[serde(default)]
    pub format: SamplesheetFormat,
}

impl ScoringParams {
    fn validate(&self) -> Result<(), RequestError> {
        if self.pgs_id.is_none() && self.pgp_id.is_none() && self.trait_efo.is_none() {
            return Err(RequestError::invalid(
                "missing all pgs_id, pgp_id, or trait_efo",
            ));
        }
        if let Some(ids) = &self.pgs_id {
            check_accession_list(ids, "PGS")?;
        }
        if let Some(ids) = &self.pgp_id {
            check_accession_list(ids, "PGP")?;
        }
        Ok(())
    }
}

fn check_accession_list(ids: &str, prefix: &str) -> Result<(), RequestError> {
    for id in ids.split(',') {
        let digits = id.strip_prefix(prefix).unwrap_or("");
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RequestError::invalid(format!(
                "{id:?} does not match {prefix} accession pattern"
            )));
        }
    }
    Ok(())
}

/// `pipeline_param`: the job id, samplesheet, and workflow parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineParams {
    pub id: JobId,
    /// Equivalent to a calculator samplesheet.
    pub target_genomes: Vec<TargetGenome>,
    /// Workflow runtime parameters.
    pub nxf_params_file: ScoringParams,
}

impl PipelineParams {
    fn validate(&self) -> Result<(), RequestError> {
        if self.target_genomes.is_empty() {
            return Err(RequestError::invalid("target_genomes is empty"));
        }
        for genome in &self.target_genomes {
            genome.validate()?;
        }
        self.nxf_params_file.validate()
    }
}

/// Secret key metadata, used to call the key handler service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyDetails {
    pub secret_id: Uuid,
    #[serde(deserialize_with = "string_or_number_required")]
    pub secret_id_version: String,
}

impl SecretKeyDetails {
    fn validate(&self) -> Result<(), RequestError> {
        if self.secret_id.get_version_num() != 4 {
            return Err(RequestError::invalid(format!(
                "secret_id {} is not a v4 UUID",
                self.secret_id
            )));
        }
        Ok(())
    }
}

/// A validated job-launch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Globus file handler parameters for data transfer.
    pub globus_details: GlobusConfig,
    /// Calculator parameters (the workflow runtime).
    pub pipeline_param: PipelineParams,
    /// crypt4gh secret key metadata for the key handler service.
    pub secret_key_details: SecretKeyDetails,
}

impl JobRequest {
    /// Decode and validate a raw bus payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, RequestError> {
        let request: JobRequest = serde_json::from_slice(payload).map_err(|e| {
            if matches!(
                e.classify(),
                serde_json::error::Category::Syntax | serde_json::error::Category::Eof
            ) {
                RequestError::Json(e)
            } else {
                RequestError::Schema(e)
            }
        })?;
        request.validate()?;
        Ok(request)
    }

    /// Run the schema rules over an already-decoded request.
    pub fn validate(&self) -> Result<(), RequestError> {
        self.globus_details.validate()?;
        self.pipeline_param.validate()?;
        self.secret_key_details.validate()
    }

    pub fn id(&self) -> &JobId {
        &self.pipeline_param.id
    }
}

/// All dot-suffixes of a path's final component, in order.
///
/// `"hi.pvar.zst"` → `[".pvar", ".zst"]`, matching the semantics the
/// format checks are written against.
pub(crate) fn suffixes(path: &str) -> Vec<String> {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let mut parts = name.split('.');
    let _stem = parts.next();
    parts.map(|p| format!(".{p}")).collect()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Accept either a JSON string or a bare number, storing the string form.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }
    let value = Option::<Raw>::deserialize(deserializer)?;
    Ok(value.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    }))
}

fn string_or_number_required<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    string_or_number(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

/// Errors decoding or validating a launch message.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The payload was not valid JSON at all.
    #[error("invalid JSON in launch message: {0}")]
    Json(#[source] serde_json::Error),

    /// The payload was JSON but did not fit the message shape.
    #[error("launch message failed validation: {0}")]
    Schema(#[source] serde_json::Error),

    /// The message decoded but broke a schema rule.
    #[error("launch message failed validation: {0}")]
    Invalid(String),
}

impl RequestError {
    fn invalid(reason: impl Into<String>) -> Self {
        RequestError::Invalid(reason.into())
    }

    /// True when the payload was not even valid JSON.
    pub fn is_decode(&self) -> bool {
        matches!(self, RequestError::Json(_))
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
