//! Error types for Petrel using snafu.
//!
//! This module defines structured error types with context selectors for
//! all error conditions in the codebase.

use snafu::prelude::*;

// ============ Storage Errors ============

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Invalid storage URL format.
    #[snafu(display("Invalid storage URL: {url}"))]
    InvalidUrl { url: String },

    /// Object store operation failed.
    #[snafu(display("Storage operation failed"))]
    ObjectStore { source: object_store::Error },

    /// IO error during storage operations.
    #[snafu(display("IO error"))]
    Io { source: std::io::Error },

    /// GCS configuration error.
    #[snafu(display("GCS configuration error"))]
    GcsConfig { source: object_store::Error },
}

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Source base URL is empty.
    #[snafu(display("odoo.base_url cannot be empty"))]
    EmptyBaseUrl,

    /// Warehouse project id is empty.
    #[snafu(display("bigquery.project_id cannot be empty"))]
    EmptyProjectId,

    /// Warehouse dataset id is empty.
    #[snafu(display("bigquery.dataset_id cannot be empty"))]
    EmptyDatasetId,

    /// Staging bucket is empty.
    #[snafu(display("bigquery.bucket_name cannot be empty"))]
    EmptyBucketName,

    /// Environment variable interpolation failed.
    #[snafu(display("Environment variable interpolation failed:\n{message}"))]
    EnvInterpolation { message: String },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML configuration"))]
    YamlParse { source: serde_yaml::Error },

    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file"))]
    ReadFile { source: std::io::Error },
}

// ============ Fetch Errors ============

/// Errors that can occur while fetching records from the source API.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    /// Failed to construct the HTTP client.
    #[snafu(display("Failed to build source HTTP client"))]
    SourceClient { source: reqwest::Error },

    /// Request failed (connect, timeout, or non-success status).
    #[snafu(display("Request for model {model} failed"))]
    Request {
        model: String,
        source: reqwest::Error,
    },

    /// Response body was not the expected JSON shape.
    #[snafu(display("Failed to decode response for model {model}"))]
    DecodeResponse {
        model: String,
        source: reqwest::Error,
    },
}

// ============ Staging Errors ============

/// Errors that can occur while staging rows to the bucket.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StagingError {
    /// Chunk size below the allowed minimum.
    #[snafu(display("Chunk size must be at least 1, got {chunk_size}"))]
    InvalidChunkSize { chunk_size: usize },

    /// Row serialization failed.
    #[snafu(display("Failed to serialize row"))]
    Serialize { source: serde_json::Error },

    /// Writing a chunk to the upload stream failed.
    #[snafu(display("Failed to write staging chunk"))]
    ChunkWrite { source: std::io::Error },

    /// Finalizing the upload stream failed.
    #[snafu(display("Failed to finish staging upload"))]
    StreamFinish { source: std::io::Error },
}

// ============ Load Errors ============

/// Errors that can occur during warehouse load jobs.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LoadError {
    /// Failed to construct the HTTP client.
    #[snafu(display("Failed to build warehouse HTTP client"))]
    WarehouseClient { source: reqwest::Error },

    /// Job request failed at the transport level.
    #[snafu(display("Load job request failed"))]
    JobRequest { source: reqwest::Error },

    /// Warehouse API rejected the request.
    #[snafu(display("Warehouse API returned status {status}: {body}"))]
    JobApi { status: u16, body: String },

    /// Job response was not the expected JSON shape.
    #[snafu(display("Failed to decode load job response"))]
    JobDecode { source: reqwest::Error },

    /// Job response carried no reference to poll.
    #[snafu(display("Load job response is missing a job reference"))]
    MissingJobReference,

    /// Job completed with errors.
    #[snafu(display("Load job for table {table} failed: {detail}"))]
    JobFailed { table: String, detail: String },

    /// Job statistics carried a row count that is not a number.
    #[snafu(display("Load job reported an invalid row count: {value}"))]
    InvalidRowCount {
        value: String,
        source: std::num::ParseIntError,
    },
}

// ============ Metrics Errors ============

/// Errors that can occur during metrics initialization.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MetricsError {
    /// Failed to initialize Prometheus recorder.
    #[snafu(display("Failed to initialize Prometheus recorder"))]
    PrometheusInit {
        source: metrics_exporter_prometheus::BuildError,
    },
}

// ============ Pipeline Error (top-level) ============

/// Top-level pipeline errors that aggregate all error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    /// Storage error.
    #[snafu(display("Storage error"))]
    PipelineStorage { source: StorageError },

    /// Configuration error.
    #[snafu(display("Configuration error"))]
    Config { source: ConfigError },

    /// Source client error.
    #[snafu(display("Source error"))]
    Source { source: FetchError },

    /// Staging error.
    #[snafu(display("Staging error"))]
    Staging { source: StagingError },

    /// Warehouse load error.
    #[snafu(display("Load error"))]
    Load { source: LoadError },

    /// Address parsing error.
    #[snafu(display("Failed to parse address"))]
    AddressParse { source: std::net::AddrParseError },

    /// Metrics error.
    #[snafu(display("Metrics error"))]
    Metrics { source: MetricsError },
}
