//! Configuration parsing and validation.
//!
//! Handles loading pipeline configuration from YAML files, with environment
//! variable interpolation for credentials.

mod vars;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::path::Path;

use crate::error::{
    ConfigError, EmptyBaseUrlSnafu, EmptyBucketNameSnafu, EmptyDatasetIdSnafu, EmptyProjectIdSnafu,
    EnvInterpolationSnafu, ReadFileSnafu, YamlParseSnafu,
};

/// Main configuration structure for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub odoo: OdooConfig,
    pub bigquery: BigQueryConfig,
    /// Metrics configuration (optional, enabled by default).
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Connection settings for the Odoo REST endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdooConfig {
    /// Base URL of the Odoo instance, e.g. "https://erp.example.com".
    pub base_url: String,
    pub api_key: String,
    pub login: String,
    pub password: String,
    pub db_name: String,
}

/// Warehouse and staging bucket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigQueryConfig {
    pub project_id: String,
    pub dataset_id: String,
    /// Staging bucket URL. Accepts "gs://bucket" for Cloud Storage or a
    /// plain filesystem path for local runs.
    pub bucket_name: String,
    /// BigQuery API endpoint (default: "https://bigquery.googleapis.com").
    /// Override to point at an emulator in tests.
    #[serde(default = "default_bigquery_endpoint")]
    pub endpoint: String,
    /// OAuth bearer token for the BigQuery API. Falls back to the
    /// BIGQUERY_ACCESS_TOKEN environment variable when unset.
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_bigquery_endpoint() -> String {
    "https://bigquery.googleapis.com".to_string()
}

/// Metrics configuration for Prometheus endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    /// Address to bind the metrics HTTP server (default: "0.0.0.0:9090").
    #[serde(default = "default_metrics_address")]
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            address: default_metrics_address(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_address() -> String {
    "0.0.0.0:9090".to_string()
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_with_options(path, true)
    }

    /// Load configuration from a YAML file with optional environment variable interpolation.
    pub fn from_file_with_options(
        path: impl AsRef<Path>,
        interpolate_env: bool,
    ) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).context(ReadFileSnafu)?;

        let content = if interpolate_env {
            match vars::interpolate(&content) {
                Ok(text) => text,
                Err(errors) => {
                    return EnvInterpolationSnafu {
                        message: errors.join("\n"),
                    }
                    .fail();
                }
            }
        } else {
            content
        };

        let config: Config = serde_yaml::from_str(&content).context(YamlParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.odoo.base_url.is_empty(), EmptyBaseUrlSnafu);
        ensure!(!self.bigquery.project_id.is_empty(), EmptyProjectIdSnafu);
        ensure!(!self.bigquery.dataset_id.is_empty(), EmptyDatasetIdSnafu);
        ensure!(!self.bigquery.bucket_name.is_empty(), EmptyBucketNameSnafu);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
odoo:
  base_url: "https://erp.example.com"
  api_key: "key"
  login: "etl"
  password: "secret"
  db_name: "production"

bigquery:
  project_id: "analytics-project"
  dataset_id: "erp_mirror"
  bucket_name: "gs://staging-bucket"
"#;

    #[test]
    fn test_config_yaml_parsing() {
        let config: Config = serde_yaml::from_str(SAMPLE_YAML).unwrap();
        assert_eq!(config.odoo.base_url, "https://erp.example.com");
        assert_eq!(config.bigquery.dataset_id, "erp_mirror");
        assert_eq!(config.bigquery.endpoint, "https://bigquery.googleapis.com");
        assert!(config.bigquery.auth_token.is_none());
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.address, "0.0.0.0:9090");
    }

    #[test]
    fn test_validation_rejects_empty_project() {
        let mut config: Config = serde_yaml::from_str(SAMPLE_YAML).unwrap();
        config.bigquery.project_id = String::new();
        let error = config.validate().unwrap_err();
        assert!(matches!(error, ConfigError::EmptyProjectId));
    }

    #[test]
    fn test_validation_rejects_empty_bucket() {
        let mut config: Config = serde_yaml::from_str(SAMPLE_YAML).unwrap();
        config.bigquery.bucket_name = String::new();
        let error = config.validate().unwrap_err();
        assert!(matches!(error, ConfigError::EmptyBucketName));
    }

    #[test]
    fn test_endpoint_override() {
        let yaml = SAMPLE_YAML.replace(
            "bucket_name: \"gs://staging-bucket\"",
            "bucket_name: \"gs://staging-bucket\"\n  endpoint: \"http://localhost:9050\"",
        );
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.bigquery.endpoint, "http://localhost:9050");
    }
}
