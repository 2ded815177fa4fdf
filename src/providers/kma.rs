//! KMA village forecast (`getVilageFcst`) client

use std::time::Instant;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::ForecastProvider;
use crate::models::{ForecastCategory, GridCell, RawForecastItem};
use crate::window::TemporalWindow;
use crate::{ForecastError, Result};

const PROVIDER: &str = "kma";
const SUCCESS_CODE: &str = "00";
/// One page comfortably covers three days of every category
const ROWS_PER_PAGE: u32 = 1000;

/// Client for the grid forecast API
pub struct KmaForecastClient {
    client: ClientWithMiddleware,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct KmaEnvelope {
    response: Option<KmaResponse>,
}

#[derive(Debug, Deserialize)]
struct KmaResponse {
    header: KmaHeader,
    body: Option<KmaBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KmaHeader {
    result_code: String,
    result_msg: String,
}

#[derive(Debug, Deserialize)]
struct KmaBody {
    items: Option<KmaItems>,
}

#[derive(Debug, Deserialize)]
struct KmaItems {
    #[serde(default)]
    item: Vec<KmaItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KmaItem {
    base_date: String,
    base_time: String,
    category: String,
    fcst_date: String,
    fcst_time: String,
    fcst_value: String,
}

impl From<KmaItem> for RawForecastItem {
    fn from(item: KmaItem) -> Self {
        Self {
            issue_date: item.base_date,
            issue_time: item.base_time,
            target_date: item.fcst_date,
            target_time: item.fcst_time,
            category: ForecastCategory::from_code(&item.category),
            value: item.fcst_value,
        }
    }
}

impl KmaForecastClient {
    #[must_use]
    pub fn new(client: ClientWithMiddleware, base_url: &str, service_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn forecast_url(&self, cell: GridCell, window: &TemporalWindow) -> String {
        format!(
            "{}/getVilageFcst?serviceKey={}&numOfRows={}&pageNo=1&dataType=JSON&base_date={}&base_time={}&nx={}&ny={}",
            self.base_url,
            urlencoding::encode(&self.service_key),
            ROWS_PER_PAGE,
            window.base_date(),
            window.base_time(),
            cell.x,
            cell.y
        )
    }
}

#[async_trait]
impl ForecastProvider for KmaForecastClient {
    #[instrument(skip(self), fields(nx = cell.x, ny = cell.y))]
    async fn fetch_grid_forecast(
        &self,
        cell: GridCell,
        window: &TemporalWindow,
    ) -> Result<Vec<RawForecastItem>> {
        let start_time = Instant::now();
        let response = self.client.get(self.forecast_url(cell, window)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ForecastError::provider(
                PROVIDER,
                status.as_u16().to_string(),
                format!("Forecast API returned {status}: {text}"),
            ));
        }

        let envelope: KmaEnvelope = response.json().await.map_err(|e| {
            ForecastError::provider(PROVIDER, "PARSE", format!("Invalid forecast response: {e}"))
        })?;
        let Some(body) = envelope.response else {
            return Err(ForecastError::provider(
                PROVIDER,
                "EMPTY",
                "Forecast response has no payload",
            ));
        };

        if body.header.result_code != SUCCESS_CODE {
            warn!(
                "Forecast API non-success response: {} {}",
                body.header.result_code, body.header.result_msg
            );
            return Err(ForecastError::provider(
                PROVIDER,
                body.header.result_code,
                body.header.result_msg,
            ));
        }

        let items: Vec<RawForecastItem> = body
            .body
            .and_then(|b| b.items)
            .map(|i| i.item)
            .ok_or_else(|| {
                ForecastError::provider(PROVIDER, "EMPTY", "Forecast response has no items")
            })?
            .into_iter()
            .map(RawForecastItem::from)
            .collect();

        info!(
            "Retrieved {} forecast items in {:.3}s",
            items.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(items)
    }
}
