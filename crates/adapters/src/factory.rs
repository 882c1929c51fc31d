// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler factory wiring the process-wide clients into rehydrated jobs.

use std::sync::Arc;

use vatti_core::{HandlerFactory, HandlerFlags, JobId, ResourceHandler, Settings};

use crate::gcs::GcsClient;
use crate::handler::GoogleResourceHandler;

/// Builds [`GoogleResourceHandler`]s sharing one settings snapshot and one
/// storage client.
#[derive(Clone)]
pub struct GoogleHandlerFactory {
    settings: Arc<Settings>,
    gcs: GcsClient,
}

impl GoogleHandlerFactory {
    pub fn new(settings: Arc<Settings>, gcs: GcsClient) -> Self {
        Self { settings, gcs }
    }
}

impl HandlerFactory for GoogleHandlerFactory {
    fn handler(&self, id: &JobId, flags: HandlerFlags) -> Box<dyn ResourceHandler> {
        Box::new(GoogleResourceHandler::new(
            id.clone(),
            Arc::clone(&self.settings),
            self.gcs.clone(),
            flags,
        ))
    }
}
