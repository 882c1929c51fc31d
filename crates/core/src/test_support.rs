// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers shared across crates (behind the `test-support` feature).

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::handler::{HandlerFactory, HandlerFlags, ResourceError, ResourceHandler};
use crate::id::JobId;
use crate::request::JobRequest;
use crate::settings::{BusSettings, Namespace, Settings};
use crate::state::JobState;

/// Shared call log for [`ScriptedHandler`], readable from the test body.
pub type HandlerLog = Arc<Mutex<Vec<String>>>;

/// A resource handler with scriptable failures and a call log.
pub struct ScriptedHandler {
    flags: HandlerFlags,
    /// Storage error message returned by `create_resources`.
    pub fail_create: Option<String>,
    /// Pretend the work bucket already existed: record the flag and raise.
    pub work_bucket_exists: bool,
    /// Storage error message returned by `destroy_resources`.
    pub fail_destroy: Option<String>,
    pub log: HandlerLog,
}

impl ScriptedHandler {
    pub fn new() -> Self {
        Self {
            flags: HandlerFlags::default(),
            fail_create: None,
            work_bucket_exists: false,
            fail_destroy: None,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_flags(mut self, flags: HandlerFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for ScriptedHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceHandler for ScriptedHandler {
    async fn create_resources(&mut self, request: &JobRequest) -> Result<(), ResourceError> {
        self.log.lock().push(format!("create:{}", request.id()));
        if self.work_bucket_exists {
            self.flags.work_bucket_existed_on_create = true;
            return Err(ResourceError::BucketExists {
                name: "pre-existing".to_string(),
            });
        }
        if let Some(message) = &self.fail_create {
            return Err(ResourceError::Storage(message.clone()));
        }
        self.flags.release_installed = true;
        Ok(())
    }

    async fn destroy_resources(&mut self, state: JobState) -> Result<(), ResourceError> {
        self.log.lock().push(format!("destroy:{state}"));
        if let Some(message) = &self.fail_destroy {
            return Err(ResourceError::Storage(message.clone()));
        }
        Ok(())
    }

    fn flags(&self) -> HandlerFlags {
        self.flags
    }
}

/// Factory producing [`ScriptedHandler`]s that share one log and script.
pub struct ScriptedHandlerFactory {
    pub log: HandlerLog,
    /// Applied to every handler this factory builds.
    pub fail_create: Option<String>,
    pub work_bucket_exists: bool,
}

impl ScriptedHandlerFactory {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            fail_create: None,
            work_bucket_exists: false,
        }
    }
}

impl Default for ScriptedHandlerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerFactory for ScriptedHandlerFactory {
    fn handler(&self, _id: &JobId, flags: HandlerFlags) -> Box<dyn ResourceHandler> {
        let mut handler = ScriptedHandler::new().with_flags(flags);
        handler.log = Arc::clone(&self.log);
        handler.fail_create = self.fail_create.clone();
        handler.work_bucket_exists = self.work_bucket_exists;
        Box::new(handler)
    }
}

impl Settings {
    /// A fully-populated settings snapshot for tests.
    pub fn for_tests() -> Self {
        Self {
            chart_path: std::path::PathBuf::from("/srv/chart"),
            namespace: Namespace::Dev,
            bus: BusSettings {
                bootstrap: "localhost:9092".to_string(),
                consumer_topic: "pipeline-launch".to_string(),
                producer_topic: "pipeline-status".to_string(),
                group_id: "vatti".to_string(),
            },
            tower_token: "test".to_string(),
            tower_workspace: "000000".to_string(),
            tower_api_url: "https://api.cloud.seqera.io".to_string(),
            gcp_project: "testproject".to_string(),
            gcp_location: "europe-west2".to_string(),
            min_overlap: 0.75,
            poll_interval: 60,
            timeout_seconds: 86_400,
            deployed_timeout_seconds: 172_800,
            db_path: std::path::PathBuf::from("vatti.db"),
            max_concurrent_jobs: 10,
            max_bus_failures: 5,
            globus_domain: "https://example.com".to_string(),
            globus_client_id: "globus-client".to_string(),
            globus_client_secret: "globus-secret".to_string(),
            globus_scopes: "openid".to_string(),
            key_handler_token: "kh-token".to_string(),
            key_handler_url: "https://keys.example.com".to_string(),
            key_handler_password: "kh-pass".to_string(),
        }
    }
}

/// A valid launch request for tests.
pub fn job_request(id: &str) -> JobRequest {
    let value = serde_json::json!({
        "globus_details": {
            "dir_path_on_guest_collection": "test@example.com/test",
            "files": [
                {"filename": "hapnest.pgen.c4gh", "size": 278_705_850_u64},
                {"filename": "hapnest.pvar.c4gh", "size": 215_004_174_u64},
                {"filename": "hapnest.psam.c4gh", "size": 2_287_u64}
            ]
        },
        "pipeline_param": {
            "id": id,
            "target_genomes": [
                {
                    "sampleset": "hapnest",
                    "chrom": null,
                    "geno": "hapnest.pgen",
                    "pheno": "hapnest.psam",
                    "variants": "hapnest.pvar",
                    "format": "pfile"
                }
            ],
            "nxf_params_file": {
                "pgs_id": "PGS000001",
                "target_build": "GRCh37"
            }
        },
        "secret_key_details": {
            "secret_id": "81d5c400-21b4-4e88-8208-8d64c9920283",
            "secret_id_version": "1"
        }
    });
    JobRequest::from_slice(value.to_string().as_bytes()).unwrap()
}
