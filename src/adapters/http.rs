use crate::domain::model::Labware;
use crate::domain::ports::ItemLookup;
use crate::utils::error::{ConsoleError, LookupError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Error body returned by the inventory service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Looks labware up at `GET {endpoint}/{barcode}`.
#[derive(Debug, Clone)]
pub struct HttpLabwareLookup {
    client: Client,
    endpoint: Url,
}

impl HttpLabwareLookup {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| ConsoleError::InvalidConfigValueError {
            field: "lookup.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    fn labware_url(&self, barcode: &str) -> std::result::Result<Url, LookupError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                let reason = format!("{} cannot be a base URL", self.endpoint);
                LookupError::new(format!("Labware lookup : {}", reason))
            })?
            .pop_if_empty()
            .push(barcode);
        Ok(url)
    }
}

#[async_trait]
impl ItemLookup<Labware> for HttpLabwareLookup {
    async fn find(&self, barcode: &str) -> std::result::Result<Labware, LookupError> {
        let url = self.labware_url(barcode)?;
        tracing::debug!("Making lookup request to: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::new(format!("Labware lookup : {}", e)))?;

        let status = response.status();
        tracing::debug!("Lookup response status: {}", status);

        if status.is_success() {
            return response
                .json::<Labware>()
                .await
                .map_err(|e| {
                    LookupError::new(format!("Labware lookup : Malformed response ({})", e))
                });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|error| error.message)
            .unwrap_or_else(|_| format!("Labware lookup : Server responded with {}", status));
        Err(LookupError::new(message))
    }
}
