use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("requested distance {0} km is out of range")]
    InvalidDistance(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("zoom level {0} is outside the supported range")]
    InvalidZoom(i32),
    #[error("camera centre ({lat}, {lng}) is not a valid coordinate")]
    InvalidCenter { lat: f64, lng: f64 },
}

/// Transient failures of the location provider. The session keeps running after any of these.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LocationError {
    #[error("no position fix within {0:?}")]
    Timeout(Duration),
    #[error("position fix is {age_ms} ms old")]
    Stale { age_ms: i64 },
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
    #[error("position fix ({lat}, {lng}) is out of range")]
    InvalidFix { lat: f64, lng: f64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum NavigationError {
    #[error("route has no waypoints")]
    EmptyRoute,
    #[error("a navigation session is already active")]
    AlreadyActive,
    #[error("navigation session is not active")]
    NotActive,
    #[error(transparent)]
    Location(#[from] LocationError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}
