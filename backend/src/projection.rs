//! Web-Mercator style transforms between geographic coordinates and screen pixels.
//!
//! Every function here is pure: the caller passes a fresh [`CameraState`] and viewport
//! size on each call and nothing is cached, so they can run once per animation frame.
//!
//! Zoom levels below 1 make the resolution blow up. Callers clamp the camera with
//! [`CameraState::with_clamped_zoom`] or check it with [`validate_camera`] first.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use shared::{CameraState, Coordinate, MAX_ZOOM, MIN_ZOOM, PixelPosition};

use crate::{error::ProjectionError, geo};

/// Equatorial radius of the spherical Mercator model, in metres.
pub const MERCATOR_RADIUS_M: f64 = 6_378_137.0;
/// Metres per pixel at zoom level 1 for 256 px tiles.
pub const INITIAL_RESOLUTION: f64 = 2.0 * PI * MERCATOR_RADIUS_M / 256.0;
pub const DEFAULT_VIEWPORT_MARGIN_PX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub north_east: Coordinate,
    pub south_west: Coordinate,
}

impl ViewportBounds {
    pub fn contains(&self, coord: Coordinate) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&coord.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&coord.lng)
    }
}

/// Fail fast on a camera the transforms cannot handle.
pub fn validate_camera(camera: &CameraState) -> Result<(), ProjectionError> {
    if !(MIN_ZOOM..=MAX_ZOOM).contains(&camera.zoom_level) {
        return Err(ProjectionError::InvalidZoom(camera.zoom_level));
    }
    if !camera.center().is_valid() {
        return Err(ProjectionError::InvalidCenter {
            lat: camera.lat,
            lng: camera.lng,
        });
    }
    Ok(())
}

pub fn coordinate_to_pixel(
    coord: Coordinate,
    camera: &CameraState,
    viewport_width: f64,
    viewport_height: f64,
) -> PixelPosition {
    let resolution = resolution(camera.zoom_level);

    let delta_x = (lng_to_mercator_x(coord.lng) - lng_to_mercator_x(camera.lng)) / resolution;
    let delta_y = (lat_to_mercator_y(coord.lat) - lat_to_mercator_y(camera.lat)) / resolution;

    PixelPosition {
        x: viewport_width / 2.0 + delta_x,
        // screen y grows downwards
        y: viewport_height / 2.0 - delta_y,
    }
}

pub fn pixel_to_coordinate(
    pixel: PixelPosition,
    camera: &CameraState,
    viewport_width: f64,
    viewport_height: f64,
) -> Coordinate {
    let resolution = resolution(camera.zoom_level);

    let delta_x = (pixel.x - viewport_width / 2.0) * resolution;
    let delta_y = (viewport_height / 2.0 - pixel.y) * resolution;

    Coordinate {
        lat: mercator_y_to_lat(lat_to_mercator_y(camera.lat) + delta_y),
        lng: mercator_x_to_lng(lng_to_mercator_x(camera.lng) + delta_x),
    }
}

/// Great-circle distance in metres.
pub fn calculate_distance(a: Coordinate, b: Coordinate) -> f64 {
    geo::haversine_m(a, b)
}

pub fn is_coordinate_in_viewport(
    coord: Coordinate,
    camera: &CameraState,
    viewport_width: f64,
    viewport_height: f64,
    margin_px: f64,
) -> bool {
    let pixel = coordinate_to_pixel(coord, camera, viewport_width, viewport_height);
    (-margin_px..=viewport_width + margin_px).contains(&pixel.x)
        && (-margin_px..=viewport_height + margin_px).contains(&pixel.y)
}

/// Marker size scaled linearly with zoom, between half and double the base size.
pub fn calculate_marker_size(base_size_px: u32, zoom_level: i32) -> u32 {
    let scale = (f64::from(zoom_level) / 8.0).clamp(0.5, 2.0);
    (f64::from(base_size_px) * scale).round() as u32
}

pub fn viewport_bounds(
    camera: &CameraState,
    viewport_width: f64,
    viewport_height: f64,
) -> ViewportBounds {
    let north_east = pixel_to_coordinate(
        PixelPosition {
            x: viewport_width,
            y: 0.0,
        },
        camera,
        viewport_width,
        viewport_height,
    );
    let south_west = pixel_to_coordinate(
        PixelPosition {
            x: 0.0,
            y: viewport_height,
        },
        camera,
        viewport_width,
        viewport_height,
    );
    ViewportBounds {
        north_east,
        south_west,
    }
}

fn resolution(zoom_level: i32) -> f64 {
    debug_assert!(
        zoom_level >= MIN_ZOOM,
        "zoom level {zoom_level} must be clamped before projecting"
    );
    INITIAL_RESOLUTION / 2f64.powi(zoom_level - 1)
}

fn lng_to_mercator_x(lng: f64) -> f64 {
    lng.to_radians() * MERCATOR_RADIUS_M
}

fn lat_to_mercator_y(lat: f64) -> f64 {
    (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * MERCATOR_RADIUS_M
}

fn mercator_x_to_lng(x: f64) -> f64 {
    (x / MERCATOR_RADIUS_M).to_degrees()
}

fn mercator_y_to_lat(y: f64) -> f64 {
    (2.0 * (y / MERCATOR_RADIUS_M).exp().atan() - PI / 2.0).to_degrees()
}
