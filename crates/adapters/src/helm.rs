// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `helm` CLI wrappers.
//!
//! The values document is written to a temp file that lives until the
//! command finishes; helm reads it through `-f`.

use std::path::Path;

use tokio::process::Command;
use tracing::{error, info};

use vatti_core::{Namespace, ResourceError};

/// `helm install <release> <chart> -n <namespace> -f <values>`.
pub async fn install(
    release: &str,
    chart_path: &Path,
    namespace: Namespace,
    values_yaml: &str,
) -> Result<(), ResourceError> {
    let values_file = tempfile::NamedTempFile::new()
        .and_then(|file| {
            std::fs::write(file.path(), values_yaml)?;
            Ok(file)
        })
        .map_err(|e| ResourceError::Install(format!("couldn't write values file: {e}")))?;

    let output = Command::new("helm")
        .arg("install")
        .arg(release)
        .arg(chart_path)
        .arg("-n")
        .arg(namespace.as_str())
        .arg("-f")
        .arg(values_file.path())
        .output()
        .await
        .map_err(|e| ResourceError::Install(format!("couldn't run helm: {e}")))?;

    if output.status.success() {
        info!(release, "helm install OK");
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        error!(release, %stderr, "helm install failed");
        Err(ResourceError::Install(stderr))
    }
}

/// `helm uninstall --namespace <namespace> <release>`.
pub async fn uninstall(release: &str, namespace: Namespace) -> Result<(), ResourceError> {
    let output = Command::new("helm")
        .arg("uninstall")
        .arg("--namespace")
        .arg(namespace.as_str())
        .arg(release)
        .output()
        .await
        .map_err(|e| ResourceError::Uninstall(format!("couldn't run helm: {e}")))?;

    if output.status.success() {
        info!(release, "helm uninstall OK");
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        error!(release, %stderr, "helm uninstall failed");
        Err(ResourceError::Uninstall(stderr))
    }
}
