//! HTTP implementation of the diagnosis service
//!
//! Talks JSON to the diagnosis backend: `POST /chat` for exchanges,
//! `GET /vehicles/search` for vehicle lookup, and `GET /providers` /
//! `PUT /providers/active` for reasoning-provider management.

use crate::config::ServiceConfig;
use crate::error::{DiagchatError, Result};
use crate::service::{
    DiagnosisService, ExchangeRequest, ExchangeResponse, ProviderList, VehicleMatch,
};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Diagnosis service reached over HTTP
///
/// # Examples
///
/// ```
/// use diagchat::config::ServiceConfig;
/// use diagchat::service::HttpDiagnosisService;
///
/// let service = HttpDiagnosisService::new(ServiceConfig::default()).unwrap();
/// assert_eq!(service.base_url().as_str(), "http://localhost:8000/api/");
/// ```
pub struct HttpDiagnosisService {
    client: Client,
    base_url: Url,
}

/// Body of `GET /vehicles/search`
#[derive(Debug, Deserialize)]
struct VehicleSearchResponse {
    #[serde(default)]
    results: Vec<VehicleMatch>,
}

/// Body of `PUT /providers/active`
#[derive(Debug, Serialize)]
struct SetActiveProviderRequest<'a> {
    provider: &'a str,
}

impl HttpDiagnosisService {
    /// Create a new HTTP service client
    ///
    /// # Errors
    ///
    /// Returns error if the base url cannot be parsed or the HTTP client
    /// cannot be built
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DiagchatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized diagnosis service client: base_url={}, timeout={}s",
            base_url,
            config.timeout_seconds
        );

        Ok(Self { client, base_url })
    }

    /// Base url every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DiagchatError::Config(format!("Invalid endpoint {}: {}", path, e)).into())
    }
}

/// Parses a base url, forcing a trailing slash so relative joins keep its path
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized)
        .map_err(|e| DiagchatError::Config(format!("Invalid base_url {}: {}", raw, e)).into())
}

/// Turns a non-success status into an error carrying the body text
async fn check_status(response: Response, what: &str) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    tracing::error!("{} returned error {}: {}", what, status, error_text);
    Err(format!("{} returned error {}: {}", what, status, error_text))
}

#[async_trait]
impl DiagnosisService for HttpDiagnosisService {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<ExchangeResponse> {
        let url = self.endpoint("chat")?;

        tracing::debug!(
            session_id = ?request.session_id,
            action = ?request.action,
            has_message = request.message.is_some(),
            rewind_to_turn = ?request.rewind_to_turn,
            "Sending exchange"
        );

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Exchange request failed: {}", e);
                DiagchatError::ExchangeFailed(format!("Request failed: {}", e))
            })?;

        let response = check_status(response, "Diagnosis service")
            .await
            .map_err(DiagchatError::ExchangeFailed)?;

        let body: ExchangeResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse exchange response: {}", e);
            DiagchatError::ExchangeFailed(format!("Failed to parse response: {}", e))
        })?;

        tracing::debug!(
            session_id = %body.session_id,
            step = %body.current_step,
            prompt = %body.prompt.kind,
            diagnostic_turn = ?body.diagnostic_turn,
            "Received exchange response"
        );

        Ok(body)
    }

    async fn search_vehicles(&self, query: &str, limit: usize) -> Result<Vec<VehicleMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.endpoint("vehicles/search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &limit.to_string());

        tracing::debug!("Searching vehicles: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("Vehicle search failed: {}", e);
            DiagchatError::Lookup(format!("Vehicle search failed: {}", e))
        })?;
        let response = check_status(response, "Vehicle search")
            .await
            .map_err(DiagchatError::Lookup)?;

        let body: VehicleSearchResponse = response.json().await.map_err(|e| {
            DiagchatError::Lookup(format!("Failed to parse vehicle search response: {}", e))
        })?;

        Ok(body.results)
    }

    async fn list_providers(&self) -> Result<ProviderList> {
        let url = self.endpoint("providers")?;

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("Provider listing failed: {}", e);
            DiagchatError::Lookup(format!("Provider listing failed: {}", e))
        })?;
        let response = check_status(response, "Provider listing")
            .await
            .map_err(DiagchatError::Lookup)?;

        response
            .json()
            .await
            .map_err(|e| DiagchatError::Lookup(format!("Failed to parse provider list: {}", e)).into())
    }

    async fn set_active_provider(&self, name: &str) -> Result<()> {
        let url = self.endpoint("providers/active")?;

        let response = self
            .client
            .put(url)
            .json(&SetActiveProviderRequest { provider: name })
            .send()
            .await
            .map_err(|e| DiagchatError::Lookup(format!("Provider activation failed: {}", e)))?;
        check_status(response, "Provider activation")
            .await
            .map_err(DiagchatError::Lookup)?;

        tracing::info!("Activated reasoning provider: {}", name);
        Ok(())
    }
}
