//! Google Cloud Storage backend.

use object_store::RetryConfig;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use snafu::prelude::*;
use std::sync::Arc;
use tracing::debug;

use super::{BackendConfig, StorageProvider};
use crate::error::{GcsConfigSnafu, StorageError};

/// GCS backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsConfig {
    pub bucket: String,
    pub key: Option<Path>,
}

impl StorageProvider {
    pub(super) async fn construct_gcs(config: GcsConfig) -> Result<Self, StorageError> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(&config.bucket);

        if let Ok(key) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            debug!("Using GOOGLE_SERVICE_ACCOUNT_KEY from environment");
            builder = builder.with_service_account_key(&key);
        }

        let store = builder
            .with_retry(RetryConfig::default())
            .build()
            .context(GcsConfigSnafu)?;

        let canonical_url = format!("https://{}.storage.googleapis.com", config.bucket);

        Ok(Self {
            config: BackendConfig::Gcs(config),
            object_store: Arc::new(store),
            canonical_url,
        })
    }
}
