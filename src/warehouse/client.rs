//! Minimal REST client for the BigQuery jobs API.
//!
//! Only the surface needed for load jobs: insert a job, poll a job. The
//! endpoint is configurable so tests can point at a local mock.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::config::BigQueryConfig;
use crate::error::{JobApiSnafu, JobDecodeSnafu, JobRequestSnafu, LoadError, WarehouseClientSnafu};

/// A BigQuery job resource, reduced to the fields the pipeline touches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<JobConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<JobStatistics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadConfiguration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadConfiguration {
    pub destination_table: TableReference,
    pub source_uris: Vec<String>,
    pub source_format: String,
    pub write_disposition: String,
    pub schema: TableSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStatus {
    pub state: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JobError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_result: Option<JobError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadStatistics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadStatistics {
    /// Int64 values come back as JSON strings on this API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_rows: Option<String>,
}

/// HTTP client for the BigQuery jobs endpoints.
#[derive(Debug, Clone)]
pub struct BigQueryClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    auth_token: Option<String>,
}

impl BigQueryClient {
    pub fn new(config: &BigQueryConfig) -> Result<Self, LoadError> {
        let http = reqwest::Client::builder()
            .build()
            .context(WarehouseClientSnafu)?;

        let auth_token = config
            .auth_token
            .clone()
            .or_else(|| std::env::var("BIGQUERY_ACCESS_TOKEN").ok());

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            auth_token,
        })
    }

    fn jobs_url(&self) -> String {
        format!(
            "{}/bigquery/v2/projects/{}/jobs",
            self.endpoint, self.project_id
        )
    }

    /// Submit a job for execution.
    pub async fn insert_job(&self, job: &Job) -> Result<Job, LoadError> {
        let request = self.authorize(self.http.post(self.jobs_url()).json(job));
        let response = request.send().await.context(JobRequestSnafu)?;
        Self::decode(response).await
    }

    /// Fetch the current state of a job.
    pub async fn get_job(&self, job_id: &str, location: Option<&str>) -> Result<Job, LoadError> {
        let url = format!("{}/{}", self.jobs_url(), job_id);
        let mut request = self.http.get(url);
        if let Some(location) = location {
            request = request.query(&[("location", location)]);
        }
        let response = self
            .authorize(request)
            .send()
            .await
            .context(JobRequestSnafu)?;
        Self::decode(response).await
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode(response: reqwest::Response) -> Result<Job, LoadError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return JobApiSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }
        response.json().await.context(JobDecodeSnafu)
    }
}
