//! `AeroDataBox` HTTP client.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::designator::FlightDesignator;
use super::FlightDataSource;
use crate::config::FlightApiConfig;
use crate::error::{Error, Result};

/// `RapidAPI` host header value.
const RAPIDAPI_HOST: &str = "aerodatabox.p.rapidapi.com";

/// Flight-data source backed by the `AeroDataBox` REST API.
#[derive(Debug, Clone)]
pub struct AeroDataBoxClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AeroDataBoxClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if no API key is configured, and `Internal` if
    /// the HTTP client cannot be built.
    pub fn from_config(config: &FlightApiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::configuration("AeroDataBox key missing"))?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// URL of the flight-by-number endpoint for one day.
    #[must_use]
    pub fn flight_url(&self, designator: &FlightDesignator, date: &str) -> String {
        format!(
            "{}/flights/number/{}/{}?withLeg=true",
            self.base_url,
            designator.code(),
            date
        )
    }
}

#[async_trait]
impl FlightDataSource for AeroDataBoxClient {
    async fn fetch(&self, designator: &FlightDesignator, date: &str) -> Result<Value> {
        let url = self.flight_url(designator, date);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::upstream(format!("AeroDataBox request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "AeroDataBox answered with an error");
            return Err(Error::upstream(format!(
                "AeroDataBox error {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::upstream(format!("AeroDataBox request failed: {e}")))?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|_| Error::upstream("Invalid AeroDataBox response"))
    }
}
