//! Local filesystem backend, used for development and tests.

use object_store::local::LocalFileSystem;
use snafu::prelude::*;
use std::sync::Arc;

use super::{BackendConfig, StorageProvider};
use crate::error::{IoSnafu, ObjectStoreSnafu, StorageError};

/// Local filesystem backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    pub path: String,
}

impl StorageProvider {
    pub(super) async fn construct_local(config: LocalConfig) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&config.path)
            .await
            .context(IoSnafu)?;

        let store = LocalFileSystem::new_with_prefix(&config.path).context(ObjectStoreSnafu)?;

        let canonical_url = format!("file://{}", config.path);

        Ok(Self {
            config: BackendConfig::Local(config),
            object_store: Arc::new(store),
            canonical_url,
        })
    }
}
