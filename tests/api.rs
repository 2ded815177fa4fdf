//! HTTP boundary driven through the router without a socket

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use airgrid::api::AppState;
use airgrid::web;
use common::*;

async fn get(uri: &str) -> (StatusCode, Value) {
    let app = web::app(AppState {
        service: harness().service,
    });
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_index() {
    let (status, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "airgrid");
}

#[tokio::test]
async fn test_forecast_by_coordinate() {
    let (status, body) = get("/predict/forecast?lat=37.5665&lng=126.978").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["data"]["days"][0]["date"], "2024-07-10");
    assert_eq!(body["data"]["days"][0]["district_name"], "중구");
    assert_eq!(body["data"]["today"]["grade"], "moderate");
}

#[tokio::test]
async fn test_forecast_by_facility() {
    let (status, body) = get("/predict/dc-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["days"][0]["district_name"], "가까운구");
    assert_eq!(body["data"]["days"][0]["temperature_c"], 25);
}

#[tokio::test]
async fn test_out_of_range_coordinate_is_bad_request() {
    let (status, body) = get("/predict/forecast?lat=91&lng=126.978").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status_code"], 400);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_missing_query_is_bad_request() {
    let (status, body) = get("/air-quality?lat=37.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status_code"], 400);
}

#[tokio::test]
async fn test_unknown_facility_is_not_found() {
    let (status, body) = get("/predict/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status_code"], 404);
}

#[tokio::test]
async fn test_daycare_search_and_nearby_stations() {
    let (status, body) = get("/daycares?name=Sunshine").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "dc-1");

    let (status, _) = get("/daycares").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get("/daycares/dc-1/nearby-stations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["distance"], "801m");
}

#[tokio::test]
async fn test_air_quality_routes() {
    let (status, body) = get("/air-quality?lat=37.5665&lng=126.978").await;
    // The fake geocoder answers 중구, which has no registered station
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status_code"], 404);

    let district = urlencoding::encode("가까운구");
    let (status, body) = get(&format!("/stations/{district}/air-quality")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["district_name"], "가까운구");
}
