//! End-to-end requests through the router with a seeded mock store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;

use izza_back::api::{create_router, AppState};
use izza_back::config::Config;
use izza_back::geo::Point;
use izza_back::search::RegionType;
use izza_back::store::{ElectricityCost, Land, MockStore, Region, StatType};

const VIEWPORT: &str = "southWestLat=37.0&southWestLng=127.5&northEastLat=38.0&northEastLng=128.5";

fn land(id: i64, area: i64, lng: f64) -> Land {
    Land {
        id,
        full_code: "5173036000".to_string(),
        address: Some(format!("강원특별자치도 횡성군 횡성읍 {}", id)),
        land_area: Some(rust_decimal::Decimal::from(area)),
        official_land_price: Some(dec!(52000)),
        use_zone_category: Some("INDUSTRIAL".to_string()),
        land_use_code: Some(220),
        center_point: Some(Point::new(lng, 37.48)),
        ..Land::default()
    }
}

fn seeded_store() -> MockStore {
    let store = MockStore::new();
    store.set_statistics(StatType::LandAreaRange, 0, 10_000);
    store.set_statistics(StatType::OfficialLandPriceRange, 0, 1_000_000);
    store.add_region(Region {
        full_code: "5173000000".to_string(),
        korean_name: "강원특별자치도 횡성군".to_string(),
        region_type: RegionType::Sig,
        sido_name: Some("강원특별자치도".to_string()),
        sig_name: Some("횡성군".to_string()),
        emd_name: None,
        ri_name: None,
        parent_code: Some("5100000000".to_string()),
        center_point: Some(Point::new(127.98, 37.49)),
    });
    store.add_electricity(ElectricityCost {
        full_code: "5173000000".to_string(),
        year: Some(2025),
        month: Some(6),
        metro: Some("강원".to_string()),
        city: Some("횡성군".to_string()),
        unit_cost: Some(dec!(150.5)),
    });
    store.add_land(land(1, 900, 127.97));
    store.add_land(land(2, 300, 127.96));
    store
}

fn app() -> Router {
    create_router(
        AppState::new(Arc::new(seeded_store()), &Config::default()),
        "",
    )
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = assert_ok!(app().oneshot(request).await);
    let status = response.status();
    let bytes = assert_ok!(to_bytes(response.into_body(), usize::MAX).await);
    let body = assert_ok!(serde_json::from_slice(&bytes));
    (status, body)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn sig_zoom_returns_group_markers() {
    let (status, body) = get(&format!("/api/v1/land-search/points?{}&zoomLevel=8", VIEWPORT)).await;

    assert_eq!(status, StatusCode::OK);
    let markers = body["data"].as_array().unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["id"], "5173000000");
    assert_eq!(markers[0]["name"], "횡성군");
    assert_eq!(markers[0]["count"], 2);
    assert_eq!(markers[0]["type"], "GROUP");
}

#[tokio::test]
async fn land_zoom_returns_land_markers() {
    let (status, body) = get(&format!("/api/v1/land-search/points?{}&zoomLevel=2", VIEWPORT)).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(body["data"][0]["type"], "LAND");
}

#[tokio::test]
async fn category_filter_narrows_markers() {
    let (_, body) = get(&format!(
        "/api/v1/land-search/points?{}&zoomLevel=2&useZoneCategories=RESIDENTIAL",
        VIEWPORT
    ))
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = get(&format!(
        "/api/v1/land-search/points?{}&zoomLevel=2&useZoneCategories=SWAMP",
        VIEWPORT
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_zoom_is_bad_request() {
    let (status, body) = get(&format!("/api/v1/land-search/points?{}&zoomLevel=15", VIEWPORT)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn land_detail_status_codes() {
    let (status, body) = get("/api/v1/land-search/land/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["useZoneCategory"], "INDUSTRIAL");

    let (status, _) = get("/api/v1/land-search/land/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get("/api/v1/land-search/land/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn area_detail_reports_the_land_region() {
    let (status, body) = get("/api/v1/land-search/area/1").await;

    assert_eq!(status, StatusCode::OK);
    let area = &body["data"];
    assert_eq!(area["fullCode"], "5173036000");
    assert_eq!(area["address"], "강원특별자치도 횡성군");
    assert_eq!(area["electricityCostInfo"]["referenceMonth"], "2025-06");
    assert_eq!(area["emergencyTextInfo"]["totalDisasterCount"], 0);
}

#[tokio::test]
async fn invalid_polygon_type_is_bad_request() {
    let (status, body) = get("/api/v1/land-search/polygon/5173000000?polygonType=CIRCLE").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("CIRCLE"));

    let (status, body) = get("/api/v1/land-search/polygon/5173000000?polygonType=GROUP").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["polygon"], json!([]));
}

#[tokio::test]
async fn region_land_count_uses_sig_prefix() {
    let (status, body) = get("/api/v1/base-info/regions/5173036000/land-count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullCode"], "5173036000");
    assert_eq!(body["data"]["count"], 2);

    let (_, body) = get("/api/v1/base-info/regions/5173036000/land-count?landAreaMin=500").await;
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn analysis_ranks_lands() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/land-analysis/analyze")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "fullCode": "51730",
                "starLandIds": ["2"],
                "landAreaRange": {"min": 0, "max": 1000, "weight": 80}
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalCount"], 2);
    assert_eq!(data["topRankedLands"][0]["landId"], 1);
    assert_eq!(data["topRankedLands"][0]["rank"], 1);
    assert_eq!(data["starredLands"][0]["landId"], 2);
    assert_eq!(data["starredLands"][0]["rank"], 2);
    assert_eq!(data["starredLands"][0]["isStarred"], true);
}

#[tokio::test]
async fn malformed_analysis_body_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/land-analysis/analyze")
        .header("content-type", "application/json")
        .body(Body::from("{\"starLandIds\": 5}"))
        .unwrap();
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("invalid parameter"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (status, body) = get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/land-search/points"].is_object());
}

#[tokio::test]
async fn analyze_rejects_weight_over_hundred() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/land-analysis/analyze")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "fullCode": "51730",
                "landPriceRange": {"min": 0, "max": 100000, "weight": 150}
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("landPriceRange"));
}
