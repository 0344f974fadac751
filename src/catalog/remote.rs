//! Client for the live sports catalog service.

use secrecy::{ExposeSecret, SecretString};

use crate::error::CatalogError;

use super::Sport;

/// Live catalog service. `GET {base_url}/sports` returns a JSON array of
/// [`Sport`].
pub struct RemoteCatalog {
    base_url: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl RemoteCatalog {
    pub fn new(base_url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    pub async fn fetch_sports(&self) -> Result<Vec<Sport>, CatalogError> {
        let url = self.url("sports");
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| CatalogError::RequestFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(CatalogError::BadStatus {
                url,
                status: resp.status().as_u16(),
            });
        }

        let sports: Vec<Sport> = resp
            .json()
            .await
            .map_err(|e| CatalogError::InvalidPayload {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if sports.iter().any(|s| s.id.trim().is_empty()) {
            return Err(CatalogError::InvalidPayload {
                url,
                reason: "sport with empty id".into(),
            });
        }
        Ok(sports)
    }
}
