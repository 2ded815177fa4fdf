use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use airgrid::api::AppState;
use airgrid::providers::{
    KmaForecastClient, SeoulAirQualityClient, VWorldGeocoder, build_http_client,
};
use airgrid::{
    AirGridConfig, Cache, Collaborators, ForecastService, InMemoryFacilityStore, SystemClock, web,
};

fn init_tracing(config: &AirGridConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

fn key_or_warn(name: &str, key: Option<&String>) -> String {
    key.cloned().unwrap_or_else(|| {
        warn!("No {} configured, upstream calls will be rejected", name);
        String::new()
    })
}

fn build_service(config: &AirGridConfig, cache: Cache) -> Result<ForecastService> {
    let providers = &config.providers;
    let http = build_http_client(config.provider_timeout(), providers.max_retries)?;

    let store = InMemoryFacilityStore::from_seed_files(
        Path::new(&config.data.stations_path),
        config
            .data
            .facilities_path
            .as_deref()
            .map(Path::new)
            .filter(|p| p.exists()),
    )
    .context("Failed to load facility seed data")?;

    let collaborators = Collaborators {
        forecast: Arc::new(KmaForecastClient::new(
            http.clone(),
            &providers.forecast_base_url,
            &key_or_warn("forecast_service_key", providers.forecast_service_key.as_ref()),
        )),
        geocoder: Arc::new(VWorldGeocoder::new(
            http.clone(),
            &providers.geocoding_base_url,
            &key_or_warn("geocoding_api_key", providers.geocoding_api_key.as_ref()),
        )),
        air_quality: Arc::new(SeoulAirQualityClient::new(
            http,
            &providers.air_quality_base_url,
            &key_or_warn("air_quality_api_key", providers.air_quality_api_key.as_ref()),
        )),
        store: Arc::new(store),
    };

    Ok(ForecastService::new(collaborators, cache)
        .with_clock(Arc::new(SystemClock::new(config.timezone()?)))
        .with_schedule(config.schedule()?)
        .with_forecast_ttl(config.forecast_ttl()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AirGridConfig::load_from_path(config_path).context("Failed to load configuration")?;
    init_tracing(&config);
    info!("Starting AirGrid {}", airgrid::VERSION);

    let cache = Cache::new();
    let _sweeper = cache.spawn_sweeper(config.sweep_interval());
    let service = build_service(&config, cache)?;

    web::run(config.server.port, AppState { service }).await?;
    Ok(())
}
