use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ExternalRecord, ImportError, ImportSource, parse_payload};
use crate::config::ImportConfig;

/// Fetches records with a plain GET against a JSON endpoint.
pub struct HttpImportSource {
    client: Client,
    endpoint: Option<String>,
}

impl HttpImportSource {
    pub fn new(config: &ImportConfig) -> Result<Self, ImportError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl ImportSource for HttpImportSource {
    async fn fetch_records(&self) -> Result<Vec<ExternalRecord>, ImportError> {
        let endpoint = self.endpoint.as_deref().ok_or(ImportError::NoEndpoint)?;
        debug!(endpoint, "fetching external records");

        let response = self.client.get(endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let records = parse_payload(&body)?;
        debug!(count = records.len(), "external records received");
        Ok(records)
    }
}
