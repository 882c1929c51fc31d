// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the workflow platform's status endpoint.

use tracing::debug;

use vatti_core::{RemoteLog, Settings, WorkflowPage};

/// Queries `GET {root}/workflow` with bearer-token auth.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    root: String,
    token: String,
    workspace: String,
}

impl PlatformClient {
    pub fn new(settings: &Settings) -> Self {
        Self::with_root(
            &settings.tower_api_url,
            &settings.tower_token,
            &settings.tower_workspace,
        )
    }

    pub fn with_root(
        root: impl Into<String>,
        token: impl Into<String>,
        workspace: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            root: root.into(),
            token: token.into(),
            workspace: workspace.into(),
        }
    }

    /// The latest log entry for a run, or `None` while the workflow hasn't
    /// started logging (or the search is ambiguous).
    pub async fn workflow_log(&self, search: &str) -> Result<Option<RemoteLog>, PlatformError> {
        debug!(search, "querying platform for workflow status");
        let response = self
            .http
            .get(format!("{}/workflow", self.root))
            .query(&[
                ("workspaceId", self.workspace.as_str()),
                ("search", search),
                ("max", "1"),
            ])
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let page: WorkflowPage = response.json().await?;
        Ok(RemoteLog::from_page(page))
    }
}

/// Errors talking to the platform API.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("platform request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform API returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
