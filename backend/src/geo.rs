use shared::Coordinate;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine great-circle distance in metres.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    haversine_m(a, b) / 1000.0
}

/// Length of a polyline in kilometres.
pub fn path_distance_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

/// Running distance from the first point, one entry per point (the first is 0).
pub fn cumulative_distances_km(path: &[Coordinate]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(path.len());
    let mut total = 0.0;
    for (idx, point) in path.iter().enumerate() {
        if idx > 0 {
            total += haversine_km(path[idx - 1], *point);
        }
        cumulative.push(total);
    }
    cumulative
}

/// Wrap a longitude into [-180, 180]. Values already in range, 180 included, are returned as is.
pub fn normalize_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
