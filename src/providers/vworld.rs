//! VWorld reverse geocoding: coordinates to district (`구`) name

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::GeocodingProvider;
use crate::models::Coordinate;
use crate::{ForecastError, Result};

const PROVIDER: &str = "vworld";

pub struct VWorldGeocoder {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct VWorldEnvelope {
    response: VWorldResponse,
}

#[derive(Debug, Deserialize)]
struct VWorldResponse {
    status: String,
    #[serde(default)]
    result: Vec<VWorldAddress>,
    error: Option<VWorldError>,
}

#[derive(Debug, Deserialize)]
struct VWorldAddress {
    structure: VWorldStructure,
}

#[derive(Debug, Deserialize)]
struct VWorldStructure {
    /// Second-level administrative unit, the district
    #[serde(default)]
    level2: String,
}

#[derive(Debug, Deserialize)]
struct VWorldError {
    code: String,
    text: String,
}

impl VWorldGeocoder {
    #[must_use]
    pub fn new(client: ClientWithMiddleware, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl GeocodingProvider for VWorldGeocoder {
    #[instrument(skip(self))]
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String> {
        // VWorld takes the point as "lon,lat"
        let url = format!(
            "{}?service=address&request=getAddress&version=2.0&crs=epsg:4326&point={},{}&format=json&type=both&key={}",
            self.base_url,
            coordinate.longitude,
            coordinate.latitude,
            urlencoding::encode(&self.api_key)
        );
        let not_found = || ForecastError::NoAddressFound {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        };

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::provider(
                PROVIDER,
                status.as_u16().to_string(),
                format!("Geocoding API returned {status}"),
            ));
        }

        let envelope: VWorldEnvelope = response.json().await.map_err(|e| {
            ForecastError::provider(PROVIDER, "PARSE", format!("Invalid geocoding response: {e}"))
        })?;
        let body = envelope.response;

        match body.status.as_str() {
            "OK" => {}
            "NOT_FOUND" => return Err(not_found()),
            other => {
                let (code, text) = body
                    .error
                    .map_or_else(|| (other.to_string(), String::new()), |e| (e.code, e.text));
                return Err(ForecastError::provider(PROVIDER, code, text));
            }
        }

        let district = body
            .result
            .into_iter()
            .map(|a| a.structure.level2)
            .find(|name| !name.is_empty())
            .ok_or_else(not_found)?;
        debug!("Resolved {} to {}", coordinate.format_coordinates(), district);
        Ok(district)
    }
}
