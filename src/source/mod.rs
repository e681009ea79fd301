//! Source client for the Odoo REST endpoint.
//!
//! Fetches full record sets per entity. Fetch failures degrade to an empty
//! record set so one unreachable model does not abort the whole run.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OdooConfig;
use crate::emit;
use crate::error::{DecodeResponseSnafu, FetchError, RequestSnafu, SourceClientSnafu};
use crate::metrics::events::FetchFailed;
use crate::record::{EntitySpec, Record};

/// Fixed timeout for a single fetch request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Odoo bulk-export endpoint.
#[derive(Debug, Clone)]
pub struct OdooClient {
    http: reqwest::Client,
    base_url: String,
    config: OdooConfig,
}

#[derive(Serialize)]
struct FieldsPayload {
    fields: Vec<&'static str>,
}

#[derive(Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<Record>,
}

impl OdooClient {
    pub fn new(config: OdooConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context(SourceClientSnafu)?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    /// Fetch all records for an entity, degrading to an empty set on error.
    pub async fn fetch(&self, entity: &EntitySpec) -> Vec<Record> {
        match self.try_fetch(entity).await {
            Ok(records) => records,
            Err(error) => {
                warn!(
                    "Fetch for {} failed, continuing with no records: {}",
                    entity.model, error
                );
                emit!(FetchFailed {
                    model: entity.model,
                });
                Vec::new()
            }
        }
    }

    /// Fetch all records for an entity, propagating any failure.
    pub async fn try_fetch(&self, entity: &EntitySpec) -> Result<Vec<Record>, FetchError> {
        let url = format!("{}/send_request", self.base_url);
        let payload = FieldsPayload {
            fields: entity.requested_fields(),
        };

        debug!("Fetching {} from {}", entity.model, url);

        // The endpoint expects credentials both as query parameters and as
        // headers, and reads the field list from a JSON body on GET.
        let response = self
            .http
            .get(&url)
            .query(&[
                ("model", entity.model),
                ("login", self.config.login.as_str()),
                ("password", self.config.password.as_str()),
                ("api-key", self.config.api_key.as_str()),
                ("db", self.config.db_name.as_str()),
                ("Content-Type", "application/json"),
            ])
            .header("login", self.config.login.as_str())
            .header("password", self.config.password.as_str())
            .header("api-key", self.config.api_key.as_str())
            .header("db", self.config.db_name.as_str())
            .json(&payload)
            .send()
            .await
            .context(RequestSnafu {
                model: entity.model,
            })?
            .error_for_status()
            .context(RequestSnafu {
                model: entity.model,
            })?;

        let body: RecordsResponse = response.json().await.context(DecodeResponseSnafu {
            model: entity.model,
        })?;

        Ok(body.records)
    }
}
