//! Warehouse bulk loading.
//!
//! Each staged NDJSON object is loaded into its destination table with a
//! truncate-and-replace job, so a table is only ever replaced atomically.

mod client;

pub use client::{
    BigQueryClient, Job, JobConfiguration, JobError, JobReference, JobStatistics, JobStatus,
    LoadConfiguration, LoadStatistics, TableFieldSchema, TableReference, TableSchema,
};

use snafu::prelude::*;
use std::time::Duration;
use tracing::debug;

use crate::config::BigQueryConfig;
use crate::error::{
    InvalidRowCountSnafu, JobFailedSnafu, LoadError, MissingJobReferenceSnafu,
};

pub const SOURCE_FORMAT: &str = "NEWLINE_DELIMITED_JSON";
pub const WRITE_DISPOSITION: &str = "WRITE_TRUNCATE";

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const DONE_STATE: &str = "DONE";

/// Runs truncate-and-replace load jobs against the warehouse.
#[derive(Debug, Clone)]
pub struct BulkLoader {
    client: BigQueryClient,
    project_id: String,
    dataset_id: String,
}

impl BulkLoader {
    pub fn new(config: &BigQueryConfig) -> Result<Self, LoadError> {
        Ok(Self {
            client: BigQueryClient::new(config)?,
            project_id: config.project_id.clone(),
            dataset_id: config.dataset_id.clone(),
        })
    }

    /// Load a staged NDJSON object into `table`, replacing its contents.
    ///
    /// Every column is declared as STRING. Blocks until the job reaches a
    /// terminal state and returns the row count the warehouse reports.
    pub async fn load(
        &self,
        table: &str,
        source_uri: &str,
        columns: &[String],
    ) -> Result<u64, LoadError> {
        let job = self.build_job(table, source_uri, columns);
        let inserted = self.client.insert_job(&job).await?;
        let reference = inserted
            .job_reference
            .clone()
            .context(MissingJobReferenceSnafu)?;
        debug!("Load job {} started for table {}", reference.job_id, table);

        let done = self.wait_for_done(&reference, inserted).await?;

        if let Some(status) = &done.status {
            if status.error_result.is_some() || !status.errors.is_empty() {
                return JobFailedSnafu {
                    table,
                    detail: describe_errors(status),
                }
                .fail();
            }
        }

        let rows = match done
            .statistics
            .and_then(|s| s.load)
            .and_then(|l| l.output_rows)
        {
            Some(value) => value
                .parse::<u64>()
                .context(InvalidRowCountSnafu { value: value.clone() })?,
            None => 0,
        };
        Ok(rows)
    }

    fn build_job(&self, table: &str, source_uri: &str, columns: &[String]) -> Job {
        let fields = columns
            .iter()
            .map(|name| TableFieldSchema {
                name: name.clone(),
                field_type: "STRING".to_string(),
            })
            .collect();

        Job {
            configuration: Some(JobConfiguration {
                load: Some(LoadConfiguration {
                    destination_table: TableReference {
                        project_id: self.project_id.clone(),
                        dataset_id: self.dataset_id.clone(),
                        table_id: table.to_string(),
                    },
                    source_uris: vec![source_uri.to_string()],
                    source_format: SOURCE_FORMAT.to_string(),
                    write_disposition: WRITE_DISPOSITION.to_string(),
                    schema: TableSchema { fields },
                }),
            }),
            ..Default::default()
        }
    }

    async fn wait_for_done(&self, reference: &JobReference, job: Job) -> Result<Job, LoadError> {
        let mut job = job;
        loop {
            let state = job
                .status
                .as_ref()
                .map(|s| s.state.as_str())
                .unwrap_or_default();
            if state == DONE_STATE {
                return Ok(job);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            job = self
                .client
                .get_job(&reference.job_id, reference.location.as_deref())
                .await?;
        }
    }
}

fn describe_errors(status: &JobStatus) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(error) = &status.error_result {
        parts.push(render_error(error));
    }
    for error in &status.errors {
        let rendered = render_error(error);
        if !parts.contains(&rendered) {
            parts.push(rendered);
        }
    }
    parts.join("; ")
}

fn render_error(error: &JobError) -> String {
    match &error.reason {
        Some(reason) => format!("{}: {}", reason, error.message),
        None => error.message.clone(),
    }
}
