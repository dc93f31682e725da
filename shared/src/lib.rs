use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest zoom level the map camera may reach.
pub const MIN_ZOOM: i32 = 1;
/// Highest zoom level the map camera may reach.
pub const MAX_ZOOM: i32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// `true` when both components are finite and inside the WGS-84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Screen-space point. Only meaningful for the camera and viewport size that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPosition {
    pub x: f64,
    pub y: f64,
}

/// Map viewport centre and zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub lat: f64,
    pub lng: f64,
    pub zoom_level: i32,
}

impl CameraState {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    pub fn with_clamped_zoom(self) -> Self {
        Self {
            zoom_level: self.zoom_level.clamp(MIN_ZOOM, MAX_ZOOM),
            ..self
        }
    }

    pub fn zoom_in(self) -> Self {
        Self {
            zoom_level: self.zoom_level.saturating_add(1),
            ..self
        }
        .with_clamped_zoom()
    }

    pub fn zoom_out(self) -> Self {
        Self {
            zoom_level: self.zoom_level.saturating_sub(1),
            ..self
        }
        .with_clamped_zoom()
    }

    /// Recentre on `target`, zooming in to at least `min_zoom`.
    pub fn centered_on(self, target: Coordinate, min_zoom: i32) -> Self {
        Self {
            lat: target.lat,
            lng: target.lng,
            zoom_level: self.zoom_level.max(min_zoom),
        }
        .with_clamped_zoom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Bike,
    Walk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub mode: TravelMode,
    pub duration_min: u32,
    pub description: String,
    pub start_point: Coordinate,
    pub end_point: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedDestination {
    #[serde(flatten)]
    pub location: Coordinate,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartRouteRequest {
    #[serde(default)]
    pub mode: TravelMode,
    /// Desired trip duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
    /// Desired trip distance in kilometres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub current_location: Coordinate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartRouteResponse {
    pub destination: SuggestedDestination,
    pub route: Vec<Coordinate>,
    pub segments: Vec<Segment>,
    pub total_duration_min: u32,
    pub total_distance_km: f64,
    pub route_type: TravelMode,
    pub gpx_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub path: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_min: u32,
    pub segments: Vec<Segment>,
    pub gpx_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

/// One reading from a location provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    /// A fix at `location` stamped with the current time and no motion data.
    pub fn at(location: Coordinate) -> Self {
        Self {
            lat: location.lat,
            lng: location.lng,
            speed_mps: None,
            heading_deg: None,
            accuracy_m: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_speed(self, speed_mps: f64) -> Self {
        Self {
            speed_mps: Some(speed_mps),
            ..self
        }
    }

    pub fn location(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixLocation {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    Straight,
    Finish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextInstruction {
    pub kind: InstructionKind,
    pub description: String,
    pub distance_m: u32,
}

/// Progress telemetry emitted once per processed position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationUpdate {
    pub speed_kmh: f64,
    pub heading_deg: f64,
    pub current_location: FixLocation,
    pub total_km: f64,
    pub remaining_km: f64,
    pub traveled_km: f64,
    pub route_index: usize,
    pub eta_min: u32,
    pub next_instruction: NextInstruction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
}
