use std::f64::consts::{PI, TAU};

use rand::{Rng, SeedableRng, rngs::SmallRng};
use shared::{Coordinate, Segment, SuggestedDestination, TravelMode};

use crate::geo::{self, normalize_longitude, round_to};

/// Crude pace used to turn a desired duration into a target distance.
const KM_PER_MINUTE: f64 = 0.05;
const KM_PER_DEGREE_LAT: f64 = 111.0;
const DEFAULT_TARGET_DISTANCE_KM: f64 = 2.0;
/// Longest trip the synthesiser will aim for, whatever the request asks.
pub const MAX_TARGET_DISTANCE_KM: f64 = 100.0;
pub const DEFAULT_DURATION_MIN: u32 = 30;
/// Peak sideways displacement of the synthetic curve, in degrees.
const CURVE_AMPLITUDE_DEG: f64 = 0.001;
/// Average riding speed used for duration estimates.
pub const AVERAGE_SPEED_KMH: f64 = 15.0;

/// A synthesised route together with its derived metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartRoute {
    pub destination: SuggestedDestination,
    pub route: Vec<Coordinate>,
    pub segments: Vec<Segment>,
    pub total_distance_km: f64,
    pub total_duration_min: u32,
    pub mode: TravelMode,
}

/// Owns the random source behind destination picking.
pub struct Synthesizer {
    rng: SmallRng,
}

impl Synthesizer {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn synthesize(
        &mut self,
        origin: Coordinate,
        mode: TravelMode,
        desired_time_min: Option<u32>,
        desired_distance_km: Option<f64>,
    ) -> SmartRoute {
        synthesize_route(
            origin,
            mode,
            desired_time_min,
            desired_distance_km,
            &mut self.rng,
        )
    }
}

/// Pick a destination roughly `target` km away from `origin` in a random direction.
///
/// The target comes from `desired_distance_km` when set, otherwise from
/// `desired_time_min` at a fixed pace, otherwise [`DEFAULT_TARGET_DISTANCE_KM`].
/// Non-positive inputs count as absent and the result never exceeds
/// [`MAX_TARGET_DISTANCE_KM`].
pub fn pick_destination<R: Rng + ?Sized>(
    origin: Coordinate,
    mode: TravelMode,
    desired_distance_km: Option<f64>,
    desired_time_min: Option<u32>,
    rng: &mut R,
) -> Coordinate {
    let target_km = target_distance_km(desired_distance_km, desired_time_min);
    let bearing = rng.gen_range(0.0..TAU);
    let delta_deg = target_km / KM_PER_DEGREE_LAT;

    let destination = Coordinate {
        lat: (origin.lat + bearing.cos() * delta_deg).clamp(-90.0, 90.0),
        lng: normalize_longitude(origin.lng + bearing.sin() * delta_deg),
    };

    tracing::debug!(
        "picked {:?} destination {:.1}km away at bearing {:.0}°: {:?}",
        mode,
        target_km,
        bearing.to_degrees(),
        destination
    );
    destination
}

fn target_distance_km(desired_distance_km: Option<f64>, desired_time_min: Option<u32>) -> f64 {
    let target = match desired_distance_km.filter(|d| d.is_finite() && *d > 0.0) {
        Some(distance) => distance,
        None => match desired_time_min.filter(|t| *t > 0) {
            Some(minutes) => f64::from(minutes) * KM_PER_MINUTE,
            None => DEFAULT_TARGET_DISTANCE_KM,
        },
    };
    target.min(MAX_TARGET_DISTANCE_KM)
}

/// Origin, a gently curved run of interior points, then destination.
///
/// Interpolation follows the short way round in longitude, so a route crossing
/// the antimeridian stays local. Interior points are kept within valid coordinates.
pub fn generate_route(origin: Coordinate, destination: Coordinate, mode: TravelMode) -> Vec<Coordinate> {
    let interior = interior_points(mode);
    let mut path = Vec::with_capacity(interior + 2);
    path.push(origin);

    let dlat = destination.lat - origin.lat;
    let dlng = normalize_longitude(destination.lng - origin.lng);
    let perp_angle = dlng.atan2(dlat) + PI / 2.0;
    for i in 1..=interior {
        let ratio = i as f64 / (interior + 1) as f64;
        let offset = (ratio * PI).sin() * CURVE_AMPLITUDE_DEG;
        path.push(Coordinate {
            lat: (origin.lat + dlat * ratio + perp_angle.cos() * offset).clamp(-90.0, 90.0),
            lng: normalize_longitude(origin.lng + dlng * ratio + perp_angle.sin() * offset),
        });
    }

    path.push(destination);
    path
}

/// Split `route` into timed segments whose durations add up to exactly `total_time_min`.
pub fn segment_route(route: &[Coordinate], mode: TravelMode, total_time_min: u32) -> Vec<Segment> {
    if route.len() < 2 {
        return Vec::new();
    }
    let last_index = route.len() - 1;
    let segment_count = last_index.min(max_segments(mode));
    let per_segment = total_time_min / segment_count as u32;
    let labels = segment_labels(mode);

    (0..segment_count)
        .map(|i| {
            let start_idx = last_index * i / segment_count;
            let end_idx = last_index * (i + 1) / segment_count;
            let duration_min = if i == segment_count - 1 {
                total_time_min - per_segment * i as u32
            } else {
                per_segment
            };
            let label = labels[i.min(labels.len() - 1)];
            Segment {
                mode,
                duration_min,
                description: format!("{label} ({duration_min} min)"),
                start_point: route[start_idx],
                end_point: route[end_idx],
            }
        })
        .collect()
}

/// Route length in kilometres, rounded to one decimal.
pub fn total_distance_km(route: &[Coordinate]) -> f64 {
    round_to(geo::path_distance_km(route), 1)
}

/// Minutes needed to cover `distance_km` at [`AVERAGE_SPEED_KMH`].
pub fn estimate_duration_min(distance_km: f64) -> u32 {
    (distance_km.max(0.0) / AVERAGE_SPEED_KMH * 60.0).round() as u32
}

pub fn synthesize_route<R: Rng + ?Sized>(
    origin: Coordinate,
    mode: TravelMode,
    desired_time_min: Option<u32>,
    desired_distance_km: Option<f64>,
    rng: &mut R,
) -> SmartRoute {
    let destination = pick_destination(origin, mode, desired_distance_km, desired_time_min, rng);
    let route = generate_route(origin, destination, mode);
    let total_duration_min = desired_time_min
        .filter(|t| *t > 0)
        .unwrap_or(DEFAULT_DURATION_MIN);
    let segments = segment_route(&route, mode, total_duration_min);
    let total_distance_km = total_distance_km(&route);

    tracing::info!(
        "synthesised {:?} route: {} waypoints, {} segments, {:.1}km, {}min",
        mode,
        route.len(),
        segments.len(),
        total_distance_km,
        total_duration_min
    );

    let (name, description) = destination_text(mode);
    SmartRoute {
        destination: SuggestedDestination {
            location: destination,
            name: name.into(),
            description: description.into(),
        },
        route,
        segments,
        total_distance_km,
        total_duration_min,
        mode,
    }
}

fn interior_points(mode: TravelMode) -> usize {
    match mode {
        TravelMode::Bike => 6,
        TravelMode::Walk => 4,
    }
}

fn max_segments(mode: TravelMode) -> usize {
    match mode {
        TravelMode::Bike => 3,
        TravelMode::Walk => 2,
    }
}

fn segment_labels(mode: TravelMode) -> &'static [&'static str] {
    match mode {
        TravelMode::Bike => &[
            "Ride out from the start",
            "Ride on to the midpoint",
            "Ride in to the destination",
        ],
        TravelMode::Walk => &["Walk out from the start", "Walk on to the destination"],
    }
}

fn destination_text(mode: TravelMode) -> (&'static str, &'static str) {
    match mode {
        TravelMode::Bike => (
            "Suggested bike-share course",
            "A city tour best enjoyed by bike.",
        ),
        TravelMode::Walk => ("Suggested walking course", "A relaxed walk around the city."),
    }
}
