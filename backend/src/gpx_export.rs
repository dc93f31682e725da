use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use shared::{Coordinate, Segment};

use crate::error::RouteError;

const CREATOR: &str = "ttutta";

/// Serialise a route as a base64-encoded GPX 1.1 document.
///
/// The path becomes a single track; every segment boundary is also written as a
/// named waypoint so GPS units can show the leg descriptions.
pub fn encode_route_as_gpx(
    route: &[Coordinate],
    name: &str,
    segments: &[Segment],
) -> Result<String, RouteError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        ..Default::default()
    };

    let mut track = Track {
        name: Some(name.to_string()),
        ..Default::default()
    };
    let mut track_segment = TrackSegment::new();
    track_segment
        .points
        .extend(route.iter().copied().map(to_waypoint));
    track.segments.push(track_segment);
    gpx.tracks.push(track);

    for segment in segments {
        let mut marker = to_waypoint(segment.start_point);
        marker.name = Some(segment.description.clone());
        gpx.waypoints.push(marker);
    }

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(coord: Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lng, coord.lat))
}

#[cfg(test)]
mod tests {
    use shared::TravelMode;

    use super::*;

    fn decode(encoded: &str) -> Gpx {
        let bytes = BASE64.decode(encoded).expect("valid base64");
        gpx::read(bytes.as_slice()).expect("valid gpx")
    }

    #[test]
    fn track_keeps_every_point_in_order() {
        let route = vec![
            Coordinate::new(36.3504, 127.3845),
            Coordinate::new(36.3550, 127.3700),
            Coordinate::new(36.3621, 127.3489),
        ];
        let parsed = decode(&encode_route_as_gpx(&route, "Morning ride", &[]).unwrap());

        assert_eq!(parsed.tracks.len(), 1);
        assert_eq!(parsed.tracks[0].name.as_deref(), Some("Morning ride"));
        let points = &parsed.tracks[0].segments[0].points;
        assert_eq!(points.len(), 3);
        for (waypoint, coord) in points.iter().zip(&route) {
            let point = waypoint.point();
            assert!((point.y() - coord.lat).abs() < 1e-9);
            assert!((point.x() - coord.lng).abs() < 1e-9);
        }
        assert!(parsed.waypoints.is_empty());
    }

    #[test]
    fn segment_starts_become_named_waypoints() {
        let a = Coordinate::new(36.35, 127.38);
        let b = Coordinate::new(36.36, 127.39);
        let c = Coordinate::new(36.37, 127.40);
        let segments = vec![
            Segment {
                mode: TravelMode::Walk,
                duration_min: 10,
                description: "Walk out from the start (10 min)".into(),
                start_point: a,
                end_point: b,
            },
            Segment {
                mode: TravelMode::Walk,
                duration_min: 12,
                description: "Walk on to the destination (12 min)".into(),
                start_point: b,
                end_point: c,
            },
        ];
        let parsed = decode(&encode_route_as_gpx(&[a, b, c], "walk", &segments).unwrap());

        let names: Vec<_> = parsed
            .waypoints
            .iter()
            .map(|w| w.name.clone().unwrap_or_default())
            .collect();
        assert_eq!(
            names,
            vec![
                "Walk out from the start (10 min)",
                "Walk on to the destination (12 min)"
            ]
        );
        assert!((parsed.waypoints[1].point().y() - b.lat).abs() < 1e-9);
    }

    #[test]
    fn empty_route_still_encodes() {
        let encoded = encode_route_as_gpx(&[], "empty", &[]).unwrap();
        assert!(!encoded.is_empty());
    }
}
