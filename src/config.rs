//! Configuration management for `AirGrid`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::window::{DEFAULT_LATENCY_MARGIN_MINUTES, DEFAULT_PUBLICATION_HOURS, PublicationSchedule};
use crate::{ForecastError, Result};

/// Root configuration structure for the `AirGrid` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirGridConfig {
    /// Upstream API configuration
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Forecast cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Forecast publication schedule
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Seed data locations
    #[serde(default)]
    pub data: DataConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Grid forecast service base URL
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    pub forecast_service_key: Option<String>,
    /// Reverse geocoding endpoint
    #[serde(default = "default_geocoding_base_url")]
    pub geocoding_base_url: String,
    pub geocoding_api_key: Option<String>,
    /// District air quality service base URL
    #[serde(default = "default_air_quality_base_url")]
    pub air_quality_base_url: String,
    pub air_quality_api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Forecast cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Forecast entry lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// How often expired entries are swept, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Hours of day at which forecasts are issued
    #[serde(default = "default_publication_hours")]
    pub publication_hours: Vec<u32>,
    /// Minutes after a slot before its forecast is considered available
    #[serde(default = "default_latency_margin")]
    pub latency_margin_minutes: i64,
    /// IANA time zone the schedule is expressed in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Station seed file
    #[serde(default = "default_stations_path")]
    pub stations_path: String,
    /// Service point seed file, optional
    #[serde(default = "default_facilities_path")]
    pub facilities_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_forecast_base_url() -> String {
    "https://apis.data.go.kr/1360000/VilageFcstInfoService_2.0".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://api.vworld.kr/req/address".to_string()
}

fn default_air_quality_base_url() -> String {
    "http://openAPI.seoul.go.kr:8088".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_publication_hours() -> Vec<u32> {
    DEFAULT_PUBLICATION_HOURS.to_vec()
}

fn default_latency_margin() -> i64 {
    DEFAULT_LATENCY_MARGIN_MINUTES
}

fn default_timezone() -> String {
    "Asia/Seoul".to_string()
}

fn default_stations_path() -> String {
    "data/stations.json".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_facilities_path() -> Option<String> {
    Some("data/facilities.json".to_string())
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            forecast_base_url: default_forecast_base_url(),
            forecast_service_key: None,
            geocoding_base_url: default_geocoding_base_url(),
            geocoding_api_key: None,
            air_quality_base_url: default_air_quality_base_url(),
            air_quality_api_key: None,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            publication_hours: default_publication_hours(),
            latency_margin_minutes: default_latency_margin(),
            timezone: default_timezone(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            stations_path: default_stations_path(),
            facilities_path: default_facilities_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AirGridConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // AIRGRID__PROVIDERS__FORECAST_SERVICE_KEY and friends
        builder = builder.add_source(
            Environment::with_prefix("AIRGRID")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| ForecastError::config(format!("Failed to build configuration: {e}")))?;

        let mut config: AirGridConfig = settings
            .try_deserialize()
            .map_err(|e| ForecastError::config(format!("Failed to deserialize configuration: {e}")))?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("airgrid").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.providers.forecast_base_url.is_empty() {
            self.providers.forecast_base_url = default_forecast_base_url();
        }
        if self.providers.geocoding_base_url.is_empty() {
            self.providers.geocoding_base_url = default_geocoding_base_url();
        }
        if self.providers.air_quality_base_url.is_empty() {
            self.providers.air_quality_base_url = default_air_quality_base_url();
        }
        if self.providers.timeout_seconds == 0 {
            self.providers.timeout_seconds = default_timeout();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.cache.sweep_interval_seconds == 0 {
            self.cache.sweep_interval_seconds = default_sweep_interval();
        }
        if self.schedule.publication_hours.is_empty() {
            self.schedule.publication_hours = default_publication_hours();
        }
        if self.schedule.timezone.is_empty() {
            self.schedule.timezone = default_timezone();
        }
        if self.data.stations_path.is_empty() {
            self.data.stations_path = default_stations_path();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.schedule()?;
        Ok(())
    }

    /// Keys are optional, but must not be blank when given
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("forecast_service_key", &self.providers.forecast_service_key),
            ("geocoding_api_key", &self.providers.geocoding_api_key),
            ("air_quality_api_key", &self.providers.air_quality_api_key),
        ];
        for (name, key) in keys {
            if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                return Err(ForecastError::config(format!(
                    "Provider key '{name}' cannot be empty if provided. Either remove it or provide a valid key."
                )));
            }
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.providers.timeout_seconds > 300 {
            return Err(ForecastError::config(
                "Provider timeout cannot exceed 300 seconds",
            ));
        }

        if self.providers.max_retries > 10 {
            return Err(ForecastError::config("Provider max retries cannot exceed 10"));
        }

        if self.cache.ttl_seconds > 86_400 {
            return Err(ForecastError::config(
                "Cache TTL cannot exceed 86400 seconds (1 day)",
            ));
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ForecastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ForecastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        let urls = [
            &self.providers.forecast_base_url,
            &self.providers.geocoding_base_url,
            &self.providers.air_quality_base_url,
        ];
        if let Some(bad) = urls
            .iter()
            .find(|u| !u.starts_with("http://") && !u.starts_with("https://"))
        {
            return Err(ForecastError::config(format!(
                "Provider base URL '{bad}' must be a valid HTTP or HTTPS URL"
            )));
        }

        self.timezone()?;
        Ok(())
    }

    /// Time zone the publication schedule runs in
    pub fn timezone(&self) -> Result<Tz> {
        Tz::from_str(&self.schedule.timezone).map_err(|_| {
            ForecastError::config(format!("Unknown time zone '{}'", self.schedule.timezone))
        })
    }

    pub fn schedule(&self) -> Result<PublicationSchedule> {
        PublicationSchedule::new(
            self.schedule.publication_hours.clone(),
            self.schedule.latency_margin_minutes,
        )
    }

    #[must_use]
    pub fn forecast_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache.sweep_interval_seconds)
    }

    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.providers.timeout_seconds))
    }
}
