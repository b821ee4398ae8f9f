use reqwest::StatusCode;

use crate::models::catalog::{CatalogEntry, SearchResponse};
use crate::utils::errors::CatalogError;
use crate::SETTINGS;

/// HTTP client for the external card catalog.
///
/// The catalog is read-only and unauthenticated; every call either yields
/// entries, a clean not-found, or an error carrying the response body. Rate
/// limiting is the cache's job, not this client's.
pub struct CatalogClient {
    base_url: String,
    http: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_settings() -> Self {
        let settings = SETTINGS.get().expect("Settings not initialized");
        Self::new(&settings.catalog_server)
    }

    /// Free-text search over the catalog.
    ///
    /// # Arguments
    /// * `query` - The search text, passed through as the `q` parameter.
    ///
    /// # Returns
    /// * `Ok(Vec<CatalogEntry>)` - The matching entries, empty on no match.
    /// * `Err(CatalogError)` - The request failed or the body was invalid.
    pub async fn search_by_text(&self, query: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let api_url = format!("{}/cards/search", self.base_url);
        let request = self.http.get(api_url).query(&[("q", query)]);

        match request.send().await {
            Err(error) => Err(CatalogError::UnexpectedRequestError(error.to_string())),
            Ok(response) => match response.status() {
                StatusCode::NOT_FOUND => Ok(Vec::new()),
                StatusCode::OK => {
                    let body = response.json::<SearchResponse>().await.map_err(|e| {
                        return CatalogError::InvalidResponseBody(e.to_string());
                    })?;
                    Ok(body.cards)
                }
                _ => {
                    let response_body = response.text().await.unwrap_or("NO MESSAGE".to_string());
                    Err(CatalogError::UnexpectedRequestError(response_body))
                }
            },
        }
    }

    /// Looks a card up by name, either exact or fuzzy.
    ///
    /// # Returns
    /// * `Ok(Some(CatalogEntry))` - The resolved entry.
    /// * `Ok(None)` - The catalog has no card under that name.
    /// * `Err(CatalogError)` - The request failed or the body was invalid.
    pub async fn get_by_name(
        &self,
        name: &str,
        exact: bool,
    ) -> Result<Option<CatalogEntry>, CatalogError> {
        let api_url = format!("{}/cards/named", self.base_url);
        let mode = if exact { "exact" } else { "fuzzy" };
        let request = self.http.get(api_url).query(&[(mode, name)]);

        match request.send().await {
            Err(error) => Err(CatalogError::UnexpectedRequestError(error.to_string())),
            Ok(response) => match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                StatusCode::OK => {
                    let entry = response.json::<CatalogEntry>().await.map_err(|e| {
                        return CatalogError::InvalidResponseBody(e.to_string());
                    })?;
                    Ok(Some(entry))
                }
                _ => {
                    let response_body = response.text().await.unwrap_or("NO MESSAGE".to_string());
                    Err(CatalogError::UnexpectedRequestError(response_body))
                }
            },
        }
    }

    /// Fetches one card by catalog id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<CatalogEntry>, CatalogError> {
        let api_url = format!("{}/cards/{}", self.base_url, id);

        match self.http.get(api_url).send().await {
            Err(error) => Err(CatalogError::UnexpectedRequestError(error.to_string())),
            Ok(response) => match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                StatusCode::OK => {
                    let entry = response.json::<CatalogEntry>().await.map_err(|e| {
                        return CatalogError::InvalidResponseBody(e.to_string());
                    })?;
                    Ok(Some(entry))
                }
                _ => {
                    let response_body = response.text().await.unwrap_or("NO MESSAGE".to_string());
                    Err(CatalogError::UnexpectedRequestError(response_body))
                }
            },
        }
    }
}
