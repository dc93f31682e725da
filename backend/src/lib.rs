pub mod config;
pub mod error;
pub mod geo;
pub mod gpx_export;
pub mod navigation;
pub mod projection;
pub mod stations;
pub mod synth;

use std::sync::{Arc, Mutex, PoisonError};

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use shared::{
    ApiError, Coordinate, RouteRequest, RouteResponse, SmartRouteRequest, SmartRouteResponse,
};
use tower_http::cors::{Any, CorsLayer};

use crate::error::RouteError;
use crate::gpx_export::encode_route_as_gpx;
use crate::synth::{
    MAX_TARGET_DISTANCE_KM, Synthesizer, estimate_duration_min, generate_route, segment_route,
};

#[derive(Clone)]
pub struct AppState {
    pub synthesizer: Arc<Mutex<Synthesizer>>,
}

impl AppState {
    pub fn new(synthesizer: Synthesizer) -> Self {
        Self {
            synthesizer: Arc::new(Mutex::new(synthesizer)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/smart-route", post(smart_route_handler))
        .route("/api/route", post(route_handler))
        .layer(cors)
        .with_state(state)
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

async fn smart_route_handler(
    State(state): State<AppState>,
    Json(req): Json<SmartRouteRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_valid(req.current_location).map_err(bad_request)?;
    if let Some(distance) = req.distance {
        ensure_reasonable_distance(distance).map_err(bad_request)?;
    }

    let smart = {
        // A panic mid-draw leaves the RNG usable.
        let mut synthesizer = state.synthesizer.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("synthesizer lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        });
        synthesizer.synthesize(req.current_location, req.mode, req.time, req.distance)
    };

    let gpx_base64 = encode_route_as_gpx(&smart.route, &smart.destination.name, &smart.segments)
        .map_err(internal_error)?;

    Ok(Json(SmartRouteResponse {
        destination: smart.destination,
        route: smart.route,
        segments: smart.segments,
        total_duration_min: smart.total_duration_min,
        total_distance_km: smart.total_distance_km,
        route_type: smart.mode,
        gpx_base64,
    }))
}

async fn route_handler(Json(req): Json<RouteRequest>) -> ApiResult<impl IntoResponse> {
    ensure_valid(req.start).map_err(bad_request)?;
    ensure_valid(req.end).map_err(bad_request)?;

    let path = generate_route(req.start, req.end, req.mode);
    let distance_km = synth::total_distance_km(&path);
    let duration_min = req
        .time
        .filter(|t| *t > 0)
        .unwrap_or_else(|| estimate_duration_min(distance_km).max(1));
    let segments = segment_route(&path, req.mode, duration_min);
    let gpx_base64 = encode_route_as_gpx(&path, "ttutta route", &segments).map_err(internal_error)?;

    tracing::debug!(
        "route {:?} -> {:?}: {:.1}km, {}min",
        req.start,
        req.end,
        distance_km,
        duration_min
    );

    Ok(Json(RouteResponse {
        path,
        distance_km,
        duration_min,
        segments,
        gpx_base64,
    }))
}

fn ensure_valid(coord: Coordinate) -> Result<(), RouteError> {
    if coord.is_valid() {
        Ok(())
    } else {
        Err(RouteError::InvalidCoordinate {
            lat: coord.lat,
            lng: coord.lng,
        })
    }
}

fn ensure_reasonable_distance(distance: f64) -> Result<(), RouteError> {
    if distance <= MAX_TARGET_DISTANCE_KM {
        Ok(())
    } else {
        Err(RouteError::InvalidDistance(distance))
    }
}

fn bad_request(err: RouteError) -> (StatusCode, Json<ApiError>) {
    tracing::warn!("rejected request: {err}");
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}

fn internal_error(err: RouteError) -> (StatusCode, Json<ApiError>) {
    tracing::error!("request failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
