use std::time::Duration;

use axum::{
    body::{Body, to_bytes},
    http::Request,
};
use hyper::StatusCode;
use serde_json::{Value, json};
use shared::{ApiError, RouteResponse, SmartRouteResponse, TravelMode};
use tower::ServiceExt;
use ttutta::{AppState, create_router, synth::Synthesizer};

fn test_app() -> axum::Router {
    create_router(AppState::new(Synthesizer::seeded(2024)))
}

async fn post_json(app: axum::Router, uri: &str, payload: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = tokio::time::timeout(Duration::from_secs(5), app.oneshot(request))
        .await
        .expect("request finished in time")
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn smart_route_for_a_half_hour_ride() {
    let payload = json!({
        "mode": "bike",
        "time": 30,
        "current_location": {"lat": 36.3504, "lng": 127.3845}
    });

    let (status, bytes) = post_json(test_app(), "/api/smart-route", payload).await;
    assert_eq!(status, StatusCode::OK);

    let body: SmartRouteResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.route.len(), 8);
    assert_eq!(body.route_type, TravelMode::Bike);
    assert_eq!(body.total_duration_min, 30);
    assert!(body.total_distance_km > 0.0);
    let sum: u32 = body.segments.iter().map(|s| s.duration_min).sum();
    assert_eq!(sum, 30);
    assert_eq!(body.route.last(), Some(&body.destination.location));
    assert!(!body.gpx_base64.is_empty());
}

#[tokio::test]
async fn smart_route_defaults_for_a_walk() {
    let payload = json!({
        "mode": "walk",
        "current_location": {"lat": 36.3504, "lng": 127.3845}
    });

    let (status, bytes) = post_json(test_app(), "/api/smart-route", payload).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["route_type"], "walk");
    assert_eq!(body["route"].as_array().map(Vec::len), Some(6));
    assert_eq!(body["total_duration_min"], 30);
    assert!(body["destination"]["lat"].is_f64());
    assert!(body["destination"]["name"].is_string());
}

#[tokio::test]
async fn smart_route_rejects_invalid_location() {
    let payload = json!({
        "mode": "bike",
        "current_location": {"lat": 95.0, "lng": 127.3845}
    });

    let (status, bytes) = post_json(test_app(), "/api/smart-route", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: ApiError = serde_json::from_slice(&bytes).unwrap();
    assert!(body.message.contains("invalid coordinate"));
}

#[tokio::test]
async fn route_between_two_points() {
    let payload = json!({
        "start": {"lat": 36.3504, "lng": 127.3845},
        "end": {"lat": 36.3621, "lng": 127.3489},
        "mode": "bike"
    });

    let (status, bytes) = post_json(test_app(), "/api/route", payload).await;
    assert_eq!(status, StatusCode::OK);

    let body: RouteResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.path.len(), 8);
    assert!((body.distance_km - 3.5).abs() <= 0.2, "got {}", body.distance_km);
    assert_eq!(body.duration_min, 14);
    let sum: u32 = body.segments.iter().map(|s| s.duration_min).sum();
    assert_eq!(sum, body.duration_min);
    assert!(!body.gpx_base64.is_empty());
}

#[tokio::test]
async fn route_honours_requested_time() {
    let payload = json!({
        "start": {"lat": 36.3504, "lng": 127.3845},
        "end": {"lat": 36.3621, "lng": 127.3489},
        "mode": "walk",
        "time": 45
    });

    let (status, bytes) = post_json(test_app(), "/api/route", payload).await;
    assert_eq!(status, StatusCode::OK);

    let body: RouteResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.path.len(), 6);
    assert_eq!(body.duration_min, 45);
    assert_eq!(body.segments.len(), 2);
}

#[tokio::test]
async fn route_rejects_out_of_range_end() {
    let payload = json!({
        "start": {"lat": 36.3504, "lng": 127.3845},
        "end": {"lat": 36.3621, "lng": 200.0}
    });

    let (status, _) = post_json(test_app(), "/api/route", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn smart_route_rejects_absurd_distance() {
    let payload = json!({
        "mode": "bike",
        "distance": 1e22,
        "current_location": {"lat": 36.3504, "lng": 127.3845}
    });

    let app = test_app();
    let (status, bytes) = post_json(app.clone(), "/api/smart-route", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: ApiError = serde_json::from_slice(&bytes).unwrap();
    assert!(body.message.contains("out of range"));

    // The synthesizer is still available afterwards.
    let payload = json!({
        "mode": "bike",
        "current_location": {"lat": 36.3504, "lng": 127.3845}
    });
    let (status, _) = post_json(app, "/api/smart-route", payload).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn smart_route_accepts_maximum_time() {
    let payload = json!({
        "mode": "walk",
        "time": u32::MAX,
        "current_location": {"lat": 36.3504, "lng": 127.3845}
    });

    let (status, bytes) = post_json(test_app(), "/api/smart-route", payload).await;
    assert_eq!(status, StatusCode::OK);
    let body: SmartRouteResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.total_duration_min, u32::MAX);
    assert!(body.total_distance_km <= 2.0 * ttutta::synth::MAX_TARGET_DISTANCE_KM);
    let sum: u64 = body.segments.iter().map(|s| u64::from(s.duration_min)).sum();
    assert_eq!(sum, u64::from(u32::MAX));
}

#[tokio::test]
async fn smart_route_at_the_edges_of_the_map() {
    let edges = [(90.0, 180.0), (-90.0, -180.0), (0.0, 179.999), (89.9995, 10.0)];
    let app = test_app();
    for (lat, lng) in edges {
        let payload = json!({
            "mode": "bike",
            "distance": 2.0,
            "current_location": {"lat": lat, "lng": lng}
        });
        let (status, bytes) = post_json(app.clone(), "/api/smart-route", payload).await;
        assert_eq!(status, StatusCode::OK, "({lat}, {lng})");

        let body: SmartRouteResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.route.iter().all(|c| c.is_valid()), "({lat}, {lng})");
        assert!(body.total_distance_km < 6.0, "({lat}, {lng}): {}", body.total_distance_km);
    }
}

#[tokio::test]
async fn route_across_the_antimeridian_takes_the_short_way() {
    let payload = json!({
        "start": {"lat": 0.0, "lng": 179.9},
        "end": {"lat": 0.0, "lng": -179.9},
        "mode": "bike"
    });

    let (status, bytes) = post_json(test_app(), "/api/route", payload).await;
    assert_eq!(status, StatusCode::OK);
    let body: RouteResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(body.path.iter().all(|c| c.is_valid()));
    assert!(body.distance_km < 30.0, "got {}", body.distance_km);
}

#[tokio::test]
async fn smart_route_survives_a_poisoned_lock() {
    let state = AppState::new(Synthesizer::seeded(7));
    let synthesizer = std::sync::Arc::clone(&state.synthesizer);
    let _ = std::thread::spawn(move || {
        let _guard = synthesizer.lock().unwrap();
        panic!("holder panicked");
    })
    .join();
    assert!(state.synthesizer.is_poisoned());

    let payload = json!({
        "mode": "bike",
        "time": 30,
        "current_location": {"lat": 36.3504, "lng": 127.3845}
    });
    let (status, bytes) = post_json(create_router(state), "/api/smart-route", payload).await;
    assert_eq!(status, StatusCode::OK);
    let body: SmartRouteResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.route.len(), 8);
}
