use std::cmp::Ordering;

use shared::{CameraState, Coordinate, Station};

use crate::{geo, projection};

pub const DEFAULT_STATION_RADIUS_KM: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStation {
    pub station: Station,
    pub distance_km: f64,
}

/// Stations within `radius_km` of `origin`, nearest first.
pub fn nearby_stations(origin: Coordinate, stations: &[Station], radius_km: f64) -> Vec<NearbyStation> {
    let mut nearby: Vec<NearbyStation> = stations
        .iter()
        .filter_map(|station| {
            let distance_km = geo::haversine_km(origin, station.location);
            (distance_km <= radius_km).then(|| NearbyStation {
                station: station.clone(),
                distance_km,
            })
        })
        .collect();
    nearby.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    tracing::debug!(
        "{} of {} stations within {:.1}km",
        nearby.len(),
        stations.len(),
        radius_km
    );
    nearby
}

/// Stations whose marker would land on screen, allowing `margin_px` of overscan.
pub fn visible_stations<'a>(
    stations: &'a [Station],
    camera: &CameraState,
    viewport_width: f64,
    viewport_height: f64,
    margin_px: f64,
) -> Vec<&'a Station> {
    stations
        .iter()
        .filter(|station| {
            projection::is_coordinate_in_viewport(
                station.location,
                camera,
                viewport_width,
                viewport_height,
                margin_px,
            )
        })
        .collect()
}
