use std::sync::Arc;

use shared::{
    Coordinate, FixLocation, InstructionKind, NavigationUpdate, NextInstruction, PositionFix,
};

use crate::{
    config::NavigationConfig,
    error::{LocationError, NavigationError},
    geo,
};

/// Waypoints of an active route plus their cumulative distances, computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    waypoints: Vec<Coordinate>,
    cumulative_km: Vec<f64>,
}

impl Route {
    pub fn new(waypoints: Vec<Coordinate>) -> Result<Self, NavigationError> {
        if waypoints.is_empty() {
            return Err(NavigationError::EmptyRoute);
        }
        let cumulative_km = geo::cumulative_distances_km(&waypoints);
        Ok(Self {
            waypoints,
            cumulative_km,
        })
    }

    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn total_km(&self) -> f64 {
        self.cumulative_km.last().copied().unwrap_or(0.0)
    }

    /// Distance along the route from the origin to waypoint `index`.
    pub fn distance_to_index_km(&self, index: usize) -> f64 {
        let last = self.cumulative_km.len().saturating_sub(1);
        self.cumulative_km.get(index.min(last)).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Arrived,
}

/// Progress state machine for one route: `Idle -> Active -> (Idle | Arrived)`.
///
/// Progress never moves backwards. A rider who backtracks keeps the furthest
/// waypoint reached, so `current_route_index` and `traveled_km` only grow.
#[derive(Debug)]
pub struct NavigationTracker {
    config: NavigationConfig,
    route: Option<Arc<Route>>,
    current_index: usize,
    traveled_km: f64,
    state: SessionState,
}

impl NavigationTracker {
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            route: None,
            current_index: 0,
            traveled_km: 0.0,
            state: SessionState::Idle,
        }
    }

    pub fn start(&mut self, route: Arc<Route>) -> Result<(), NavigationError> {
        if self.state == SessionState::Active {
            return Err(NavigationError::AlreadyActive);
        }
        tracing::info!(
            "navigation started: {} waypoints, {:.2}km",
            route.len(),
            route.total_km()
        );
        self.route = Some(route);
        self.current_index = 0;
        self.traveled_km = 0.0;
        self.state = SessionState::Active;
        Ok(())
    }

    /// Back to `Idle`, dropping the route and all progress. Safe to call in any state.
    pub fn stop(&mut self) {
        if self.state != SessionState::Idle {
            tracing::info!("navigation stopped in state {:?}", self.state);
        }
        self.route = None;
        self.current_index = 0;
        self.traveled_km = 0.0;
        self.state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn current_route_index(&self) -> usize {
        self.current_index
    }

    pub fn traveled_km(&self) -> f64 {
        self.traveled_km
    }

    pub fn process_fix(&mut self, fix: &PositionFix) -> Result<NavigationUpdate, NavigationError> {
        if self.state != SessionState::Active {
            return Err(NavigationError::NotActive);
        }
        let Some(route) = self.route.clone() else {
            return Err(NavigationError::NotActive);
        };
        let location = fix.location();
        if !location.is_valid() {
            return Err(LocationError::InvalidFix {
                lat: fix.lat,
                lng: fix.lng,
            }
            .into());
        }

        let nearest = nearest_waypoint_from(&route, self.current_index, location);
        if nearest > self.current_index {
            self.current_index = nearest;
        }
        self.traveled_km = route.distance_to_index_km(self.current_index);

        let total_km = route.total_km();
        let remaining_km = (total_km - self.traveled_km).max(0.0);

        let speed_kmh = fix.speed_mps.map(|mps| mps * 3.6).unwrap_or(0.0);
        let eta_speed_kmh = if speed_kmh > 0.0 {
            speed_kmh
        } else {
            self.config.fallback_speed_kmh
        };
        let eta_min = (remaining_km / eta_speed_kmh * 60.0).round() as u32;

        let update = NavigationUpdate {
            speed_kmh,
            heading_deg: fix.heading_deg.unwrap_or(0.0),
            current_location: FixLocation {
                lat: fix.lat,
                lng: fix.lng,
                accuracy_m: fix.accuracy_m.unwrap_or(0.0),
            },
            total_km,
            remaining_km,
            traveled_km: self.traveled_km,
            route_index: self.current_index,
            eta_min,
            next_instruction: self.next_instruction(&route),
        };

        tracing::debug!(
            "fix ({:.6}, {:.6}) -> waypoint {}/{}, {:.3}km left, eta {}min",
            fix.lat,
            fix.lng,
            self.current_index,
            route.len() - 1,
            remaining_km,
            eta_min
        );

        if remaining_km < self.config.arrival_threshold_km {
            tracing::info!("destination reached, {:.0}m left", remaining_km * 1000.0);
            self.state = SessionState::Arrived;
        }

        Ok(update)
    }

    fn next_instruction(&self, route: &Route) -> NextInstruction {
        let lookahead = self.current_index + self.config.lookahead_points;
        if lookahead >= route.len() - 1 {
            return NextInstruction {
                kind: InstructionKind::Finish,
                description: "Destination ahead".into(),
                distance_m: 0,
            };
        }
        let ahead_km = route.distance_to_index_km(lookahead) - self.traveled_km;
        NextInstruction {
            kind: InstructionKind::Straight,
            description: "Continue straight".into(),
            distance_m: (ahead_km.max(0.0) * 1000.0).round() as u32,
        }
    }
}

/// Index of the waypoint closest to `location`, searching only from `from` onwards.
fn nearest_waypoint_from(route: &Route, from: usize, location: Coordinate) -> usize {
    route
        .waypoints()
        .iter()
        .enumerate()
        .skip(from)
        .map(|(idx, point)| (idx, geo::haversine_m(location, *point)))
        .fold((from, f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 {
                candidate
            } else {
                best
            }
        })
        .0
}
