//! Seoul Open API district air quality (`ListAirQualityByDistrictService`)

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::AirQualityProvider;
use crate::models::AirQualityReading;
use crate::{ForecastError, Result};

const PROVIDER: &str = "seoul";
const SERVICE: &str = "ListAirQualityByDistrictService";
const SUCCESS_CODE: &str = "INFO-000";
const NO_DATA_CODE: &str = "INFO-200";

pub struct SeoulAirQualityClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SeoulEnvelope {
    #[serde(rename = "ListAirQualityByDistrictService")]
    service: Option<SeoulService>,
    /// Top-level result, sent instead of the service block on errors
    #[serde(rename = "RESULT")]
    result: Option<SeoulResult>,
}

#[derive(Debug, Deserialize)]
struct SeoulService {
    #[serde(rename = "RESULT")]
    result: SeoulResult,
    #[serde(default)]
    row: Vec<SeoulRow>,
}

#[derive(Debug, Deserialize)]
struct SeoulResult {
    #[serde(rename = "CODE")]
    code: String,
    #[serde(rename = "MESSAGE")]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct SeoulRow {
    msrdate: String,
    msrstename: String,
    #[serde(default)]
    grade: Option<String>,
    pm10: String,
    pm25: String,
    #[serde(default)]
    nitrogen: String,
    #[serde(default)]
    ozone: String,
    #[serde(default)]
    carbon: String,
}

impl SeoulAirQualityClient {
    #[must_use]
    pub fn new(client: ClientWithMiddleware, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

fn parse_measurement(field: &str, raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or_else(|_| {
        warn!("Unparseable {} measurement '{}', using 0", field, raw);
        0.0
    })
}

fn into_reading(row: SeoulRow, station_code: u32) -> Result<AirQualityReading> {
    let pm10 = row
        .pm10
        .trim()
        .parse::<f64>()
        .map_err(|_| ForecastError::NoDataForStation { station_code })?;
    let measured_at = NaiveDateTime::parse_from_str(&row.msrdate, "%Y%m%d%H%M").map_err(|e| {
        ForecastError::provider(
            PROVIDER,
            "PARSE",
            format!("Invalid measurement time '{}': {e}", row.msrdate),
        )
    })?;
    Ok(AirQualityReading {
        station_name: row.msrstename,
        pm10,
        pm25: parse_measurement("PM25", &row.pm25),
        ozone: parse_measurement("OZONE", &row.ozone),
        carbon_monoxide: parse_measurement("CARBON", &row.carbon),
        nitrogen_dioxide: parse_measurement("NITROGEN", &row.nitrogen),
        measured_at,
        provider_grade: row.grade.filter(|g| !g.is_empty()),
    })
}

#[async_trait]
impl AirQualityProvider for SeoulAirQualityClient {
    #[instrument(skip(self))]
    async fn fetch_air_quality(&self, station_code: u32) -> Result<AirQualityReading> {
        let url = format!(
            "{}/{}/json/{}/1/1/{}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            SERVICE,
            station_code
        );
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::provider(
                PROVIDER,
                status.as_u16().to_string(),
                format!("Air quality API returned {status}"),
            ));
        }

        let envelope: SeoulEnvelope = response.json().await.map_err(|e| {
            ForecastError::provider(
                PROVIDER,
                "PARSE",
                format!("Invalid air quality response: {e}"),
            )
        })?;

        let (result, rows) = match (envelope.service, envelope.result) {
            (Some(service), _) => (service.result, service.row),
            (None, Some(result)) => (result, Vec::new()),
            (None, None) => {
                return Err(ForecastError::provider(
                    PROVIDER,
                    "EMPTY",
                    "Failed to fetch air quality data from Seoul API",
                ));
            }
        };

        match result.code.as_str() {
            SUCCESS_CODE => {}
            NO_DATA_CODE => return Err(ForecastError::NoDataForStation { station_code }),
            _ => return Err(ForecastError::provider(PROVIDER, result.code, result.message)),
        }

        let row = rows
            .into_iter()
            .next()
            .ok_or(ForecastError::NoDataForStation { station_code })?;
        into_reading(row, station_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::build_http_client;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_with(body: serde_json::Value) -> (MockServer, SeoulAirQualityClient) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/test-key/json/ListAirQualityByDistrictService/1/1/111123",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let http = build_http_client(Duration::from_secs(5), 0).unwrap();
        let client = SeoulAirQualityClient::new(http, &server.uri(), "test-key");
        (server, client)
    }

    #[tokio::test]
    async fn test_fetch_air_quality() {
        let (_server, client) = client_with(json!({
            "ListAirQualityByDistrictService": {
                "list_total_count": 1,
                "RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다"},
                "row": [{
                    "MSRDATE": "202407091400", "MSRADMCODE": "111123", "MSRSTENAME": "종로구",
                    "MAXINDEX": "58", "GRADE": "보통", "POLLUTANT": "오존",
                    "NITROGEN": "0.021", "OZONE": "0.045", "CARBON": "0.4",
                    "SULFUROUS": "0.003", "PM10": "35", "PM25": "20"
                }]
            }
        }))
        .await;

        let reading = client.fetch_air_quality(111123).await.unwrap();
        assert_eq!(reading.station_name, "종로구");
        assert_eq!(reading.pm10, 35.0);
        assert_eq!(reading.ozone, 0.045);
        assert_eq!(reading.provider_grade.as_deref(), Some("보통"));
        assert_eq!(reading.measured_at.format("%Y-%m-%d %H:%M").to_string(), "2024-07-09 14:00");
    }

    #[tokio::test]
    async fn test_no_data_code() {
        let (_server, client) = client_with(json!({
            "RESULT": {"CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다."}
        }))
        .await;
        assert!(matches!(
            client.fetch_air_quality(111123).await,
            Err(ForecastError::NoDataForStation { station_code: 111123 })
        ));
    }

    #[tokio::test]
    async fn test_empty_rows() {
        let (_server, client) = client_with(json!({
            "ListAirQualityByDistrictService": {
                "list_total_count": 0,
                "RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다"},
                "row": []
            }
        }))
        .await;
        assert!(matches!(
            client.fetch_air_quality(111123).await,
            Err(ForecastError::NoDataForStation { .. })
        ));
    }

    #[tokio::test]
    async fn test_upstream_error_message_preserved() {
        let (_server, client) = client_with(json!({
            "RESULT": {"CODE": "ERROR-500", "MESSAGE": "서버 오류입니다."}
        }))
        .await;
        let err = client.fetch_air_quality(111123).await.unwrap_err();
        assert_eq!(err.user_message(), "서버 오류입니다.");
    }
}
