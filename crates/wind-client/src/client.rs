//! reqwest-based [`OverlaySource`] for the wind API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use overlay_cache::{OverlayQuery, OverlaySource};
use overlay_common::{OverlayResult, WindOverlay};

use crate::config::WindClientConfig;
use crate::error::WindClientError;
use crate::query::{recommendation_params, wind_params, QueryParams};
use crate::response::{merge, RecommendationsResponse, WindFieldResponse};

const WIND_ENDPOINT: &str = "wind";
const RECOMMENDATIONS_ENDPOINT: &str = "wind-recommendations";

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Client for the wind field and wind recommendation endpoints.
#[derive(Debug, Clone)]
pub struct WindClient {
    client: Client,
    config: WindClientConfig,
}

impl WindClient {
    pub fn new(config: WindClientConfig) -> Result<Self, WindClientError> {
        config.validate().map_err(WindClientError::Config)?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("dive-map-overlay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WindClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WindClientConfig {
        &self.config
    }

    /// Wind field for a query.
    #[instrument(skip(self), fields(zoom = query.zoom_level))]
    pub async fn wind_field(&self, query: &OverlayQuery) -> Result<WindFieldResponse, WindClientError> {
        self.get_json(WIND_ENDPOINT, wind_params(query)).await
    }

    /// Per-site recommendations for a query.
    #[instrument(skip(self), fields(include_unknown = self.config.include_unknown))]
    pub async fn recommendations(
        &self,
        query: &OverlayQuery,
    ) -> Result<RecommendationsResponse, WindClientError> {
        self.get_json(
            RECOMMENDATIONS_ENDPOINT,
            recommendation_params(query, self.config.include_unknown),
        )
        .await
    }

    /// Both endpoints, requested concurrently and merged.
    ///
    /// The wind field is required. A failed recommendations call degrades to
    /// an overlay without recommendations; markers then fall back to the
    /// nearest wind point.
    pub async fn overlay(&self, query: &OverlayQuery) -> Result<WindOverlay, WindClientError> {
        let (field, recommendations) =
            tokio::join!(self.wind_field(query), self.recommendations(query));

        let field = field?;
        let recommendations = match recommendations {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Wind recommendations unavailable, continuing without them");
                RecommendationsResponse::default()
            }
        };

        debug!(
            points = field.points.len(),
            recommendations = recommendations.recommendations.len(),
            "Fetched wind overlay"
        );
        Ok(merge(field, recommendations))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: QueryParams,
    ) -> Result<T, WindClientError> {
        let url = self.config.endpoint(endpoint);
        let mut attempt = 0;
        let mut delay = self.config.initial_retry_delay();

        loop {
            match self.get_once(endpoint, &url, &params).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        endpoint = endpoint,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        params: &QueryParams,
    ) -> Result<T, WindClientError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|source| WindClientError::Request { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(WindClientError::Status {
                endpoint,
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| WindClientError::Request { endpoint, source })?;

        serde_json::from_slice(&body).map_err(|source| WindClientError::Decode { endpoint, source })
    }
}

#[async_trait]
impl OverlaySource for WindClient {
    type Data = WindOverlay;

    async fn fetch(&self, query: &OverlayQuery) -> OverlayResult<WindOverlay> {
        Ok(self.overlay(query).await?)
    }
}
