//! HTTP routes over the forecast service
//!
//! Every response, errors included, uses the `{status_code, message, data}` envelope.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    Coordinate, Facility, ForecastError, ForecastReport, ForecastService, NearbyStation,
    TodayReading, VERSION,
};

#[derive(Clone)]
pub struct AppState {
    pub service: ForecastService,
}

/// Uniform response body for every route
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(message: &str, data: T) -> Json<Self> {
        Json(Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.to_string(),
            data: Some(data),
        })
    }
}

pub enum ApiError {
    Forecast(ForecastError),
    BadRequest(String),
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        ApiError::Forecast(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn status_for(err: &ForecastError) -> StatusCode {
    match err {
        ForecastError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
        ForecastError::FacilityNotFound { .. } | ForecastError::NoAddressFound { .. } => {
            StatusCode::NOT_FOUND
        }
        ForecastError::Provider { .. } => StatusCode::BAD_GATEWAY,
        ForecastError::EmptyCandidateSet | ForecastError::NoDataForStation { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ForecastError::Config { .. } | ForecastError::General { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Forecast(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    warn!("Request failed: {}", err);
                }
                (status, err.user_message())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };
        let body = ApiResponse::<()> {
            status_code: status.as_u16(),
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Deserialize)]
pub struct CoordinateQuery {
    pub lat: f64,
    pub lng: f64,
}

impl CoordinateQuery {
    fn coordinate(&self) -> crate::Result<Coordinate> {
        Coordinate::new(self.lat, self.lng)
    }
}

#[derive(Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict/forecast", get(forecast_by_coordinate))
        .route("/predict/{facility_id}", get(forecast_by_facility))
        .route("/daycares", get(search_daycares))
        .route("/daycares/{facility_id}/nearby-stations", get(nearby_stations))
        .route("/stations/{district}/air-quality", get(district_air_quality))
        .route("/air-quality", get(coordinate_air_quality))
        .with_state(state)
}

async fn index() -> Json<ApiResponse<ServiceInfo>> {
    ApiResponse::ok(
        "AirGrid is running",
        ServiceInfo {
            name: "airgrid".to_string(),
            version: VERSION.to_string(),
        },
    )
}

async fn forecast_by_coordinate(
    State(state): State<AppState>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> ApiResult<ForecastReport> {
    let Query(query) = query?;
    let report = state.service.report_by_coordinate(query.coordinate()?).await?;
    Ok(ApiResponse::ok("Forecast retrieved", report))
}

async fn forecast_by_facility(
    State(state): State<AppState>,
    Path(facility_id): Path<String>,
) -> ApiResult<ForecastReport> {
    let report = state.service.report_by_facility(&facility_id).await?;
    Ok(ApiResponse::ok("Forecast retrieved", report))
}

async fn search_daycares(
    State(state): State<AppState>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<Vec<Facility>> {
    let Query(query) = query?;
    if query.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Query parameter 'name' is required".to_string()));
    }
    let facilities = state.service.search_facilities(query.name.trim()).await?;
    Ok(ApiResponse::ok("Facilities found", facilities))
}

async fn nearby_stations(
    State(state): State<AppState>,
    Path(facility_id): Path<String>,
) -> ApiResult<Vec<NearbyStation>> {
    let stations = state.service.nearby_stations(&facility_id).await?;
    Ok(ApiResponse::ok("Nearby stations retrieved", stations))
}

async fn district_air_quality(
    State(state): State<AppState>,
    Path(district): Path<String>,
) -> ApiResult<TodayReading> {
    let reading = state.service.air_quality_by_district(&district).await?;
    Ok(ApiResponse::ok("Air quality retrieved", reading))
}

async fn coordinate_air_quality(
    State(state): State<AppState>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> ApiResult<TodayReading> {
    let Query(query) = query?;
    let reading = state
        .service
        .air_quality_by_coordinate(query.coordinate()?)
        .await?;
    Ok(ApiResponse::ok("Air quality retrieved", reading))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ForecastError::InvalidCoordinate { latitude: 91.0, longitude: 0.0 }, 400)]
    #[case(ForecastError::facility_not_found("x"), 404)]
    #[case(ForecastError::NoAddressFound { latitude: 0.0, longitude: 0.0 }, 404)]
    #[case(ForecastError::provider("kma", "03", "NO_DATA"), 502)]
    #[case(ForecastError::EmptyCandidateSet, 503)]
    #[case(ForecastError::NoDataForStation { station_code: 1 }, 503)]
    #[case(ForecastError::general("boom"), 500)]
    fn test_status_mapping(#[case] err: ForecastError, #[case] expected: u16) {
        assert_eq!(status_for(&err).as_u16(), expected);
    }
}
