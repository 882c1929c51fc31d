// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The SQLite-backed job store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{Connection, ErrorCode, OptionalExtension};
use tracing::{info, warn};

use vatti_core::{HandlerFactory, Job, JobRecord, NotifySender, Trigger};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    job BLOB NOT NULL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
    state TEXT CHECK(state IN ('Requested', 'Created', 'Deployed', 'Failed',
    'Succeeded')) NOT NULL
);

CREATE TRIGGER IF NOT EXISTS update_timestamp
AFTER UPDATE ON jobs
FOR EACH ROW
BEGIN
    UPDATE jobs SET updated_at = CURRENT_TIMESTAMP WHERE id = OLD.id;
END;
";

/// A job database backed by a local SQLite file.
///
/// Every operation opens its own connection and runs in its own (implicit)
/// transaction, so persistence is all-or-nothing per row. Loaded machines
/// are rehydrated through the handler factory supplied at construction.
pub struct JobStore {
    path: PathBuf,
    factory: Arc<dyn HandlerFactory>,
}

impl JobStore {
    pub fn new(path: impl Into<PathBuf>, factory: Arc<dyn HandlerFactory>) -> Self {
        Self {
            path: path.into(),
            factory,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Install the schema. Idempotent: existing tables are left alone.
    pub fn create(&self) -> Result<(), StoreError> {
        info!(path = %self.path.display(), "creating database table");
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert a new job. Fails on a duplicate id.
    pub fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let record = job.to_record();
        let blob = record.to_blob().map_err(|source| StoreError::Corrupt {
            id: job.id().to_string(),
            source,
        })?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO jobs(id, job, state) VALUES (?1, ?2, ?3)",
            (job.id().as_str(), &blob, job.state().to_string()),
        )
        .map_err(|err| {
            if let rusqlite::Error::SqliteFailure(e, _) = &err {
                if e.code == ErrorCode::ConstraintViolation {
                    return StoreError::Duplicate {
                        id: job.id().to_string(),
                    };
                }
            }
            StoreError::from(err)
        })?;
        Ok(())
    }

    /// Re-serialize the machine and overwrite the stored blob and state.
    ///
    /// `created_at` is never touched; the schema trigger bumps `updated_at`.
    pub fn update(&self, job: &Job) -> Result<(), StoreError> {
        let record = job.to_record();
        let blob = record.to_blob().map_err(|source| StoreError::Corrupt {
            id: job.id().to_string(),
            source,
        })?;
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE jobs SET job = ?2, state = ?3 WHERE id = ?1",
            (job.id().as_str(), &blob, job.state().to_string()),
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                id: job.id().to_string(),
            });
        }
        Ok(())
    }

    /// Load and rehydrate a machine, or `None` when the id is unknown.
    pub fn load(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let conn = self.connect()?;
        let blob: Option<Vec<u8>> = conn
            .query_row("SELECT job FROM jobs WHERE id = ?1", (id,), |row| {
                row.get(0)
            })
            .optional()?;
        match blob {
            None => Ok(None),
            Some(blob) => {
                let record =
                    JobRecord::from_blob(&blob).map_err(|source| StoreError::Corrupt {
                        id: id.to_string(),
                        source,
                    })?;
                Ok(Some(Job::from_record(record, self.factory.as_ref())))
            }
        }
    }

    /// All jobs that haven't failed or succeeded.
    pub fn active_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT id FROM jobs WHERE state NOT IN ('Failed', 'Succeeded')")?;
        let ids: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        drop(conn);

        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(job) = self.load(&id)? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    /// Number of active jobs, for consumer back-pressure.
    pub fn active_count(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE state NOT IN ('Failed', 'Succeeded')",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Trigger the error state in any undeployed jobs over the timeout.
    ///
    /// Deployed jobs are excluded: once a workflow is live the engine's own
    /// time cap kills it. An undeployed job past the threshold has never
    /// started sending logs back and won't recover.
    pub async fn timeout_jobs(
        &self,
        timeout_seconds: u64,
        notify: &NotifySender,
    ) -> Result<(), StoreError> {
        let sql = "SELECT id FROM jobs
            WHERE state NOT IN ('Failed', 'Deployed', 'Succeeded')
                AND created_at <= datetime('now', ?1 || ' seconds')";
        self.fail_jobs_over_threshold(sql, timeout_seconds, notify).await
    }

    /// Trigger the error state in Deployed jobs over the (much larger)
    /// deployed timeout. This should rarely fire.
    pub async fn timeout_deployed_jobs(
        &self,
        timeout_seconds: u64,
        notify: &NotifySender,
    ) -> Result<(), StoreError> {
        let sql = "SELECT id FROM jobs
            WHERE state IN ('Deployed')
                AND created_at <= datetime('now', ?1 || ' seconds')";
        self.fail_jobs_over_threshold(sql, timeout_seconds, notify).await
    }

    async fn fail_jobs_over_threshold(
        &self,
        sql: &str,
        timeout_seconds: u64,
        notify: &NotifySender,
    ) -> Result<(), StoreError> {
        let ids: Vec<String> = {
            let conn = self.connect()?;
            let mut stmt = conn.prepare(sql)?;
            // the leading - selects a time in the past
            let rows = stmt.query_map((format!("-{timeout_seconds}"),), |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };

        if ids.is_empty() {
            return Ok(());
        }
        info!(count = ids.len(), "jobs exceeding timeout detected");

        for id in ids {
            let Some(mut job) = self.load(&id)? else {
                continue;
            };
            warn!(id = %job.id(), state = %job.state(), "killing timed out job");
            if let Err(err) = job.trigger(Trigger::Error, notify, None).await {
                warn!(id = %job.id(), error = %err, "timeout transition failed");
            }
            self.update(&job)?;
        }
        Ok(())
    }
}

/// Errors from the job store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("job {id} already exists")]
    Duplicate { id: String },

    #[error("job {id} not found")]
    NotFound { id: String },

    #[error("stored job {id} could not be decoded: {source}")]
    Corrupt {
        id: String,
        source: serde_json::Error,
    },
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
