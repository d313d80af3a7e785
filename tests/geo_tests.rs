//! Integration tests for the geo module
//!
//! Tests for haversine distance, planar headings and arrow placement along
//! whole routes.

use routemark::geo::{
    distance_meters, heading, plan_arrows, ArrowPlanner, Coordinate, HeadingScale, Route,
    DEFAULT_ARROW_LAT_OFFSET, EARTH_RADIUS_KM,
};

/// Meters per degree of longitude on the equator
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_KM * 1000.0 * std::f64::consts::PI / 180.0;

/// `count` points along the equator, `step` meters apart, heading east
fn equator_route(count: usize, step: f64) -> Route {
    (0..count)
        .map(|i| Coordinate::new(0.0, i as f64 * step / METERS_PER_DEGREE))
        .collect()
}

fn sample_route() -> Route {
    Route::new(vec![
        Coordinate::new(28.60, 77.20),
        Coordinate::new(28.61, 77.21),
        Coordinate::new(28.62, 77.22),
    ])
}

// ============================================================================
// Distance Tests
// ============================================================================

#[test]
fn test_distance_identity_and_symmetry() {
    let delhi = Coordinate::new(28.6139, 77.2090);
    let gurugram = Coordinate::new(28.4595, 77.0266);

    assert_eq!(distance_meters(&delhi, &delhi), 0.0);
    assert_eq!(
        distance_meters(&delhi, &gurugram),
        distance_meters(&gurugram, &delhi)
    );
}

#[test]
fn test_distance_delhi_to_gurugram() {
    let d = distance_meters(
        &Coordinate::new(28.6139, 77.2090),
        &Coordinate::new(28.4595, 77.0266),
    );
    assert!(d > 24_000.0 && d < 25_500.0, "got {}", d);
}

#[test]
fn test_distance_along_equator_is_linear() {
    let route = equator_route(11, 300.0);
    for (a, b) in route.segments() {
        assert!((distance_meters(a, b) - 300.0).abs() < 1e-6);
    }
    assert!((route.total_distance_meters() - 3000.0).abs() < 1e-6);
}

// ============================================================================
// Heading Tests
// ============================================================================

#[test]
fn test_collinear_route_has_constant_heading() {
    let route = equator_route(6, 500.0);
    for i in 0..route.len() {
        assert!(heading(&route, i).unwrap().abs() < 1e-9);
    }
}

#[test]
fn test_heading_needs_two_points() {
    assert!(heading(&Route::default(), 0).is_none());
    assert!(heading(&Route::new(vec![Coordinate::new(1.0, 1.0)]), 0).is_none());
    assert!(heading(&sample_route(), 3).is_none());
}

// ============================================================================
// Arrow Placement Tests
// ============================================================================

#[test]
fn test_evenly_spaced_route_arrow_count() {
    // 3000 m with 2500 m spacing: one midpoint arrow, one final arrow
    assert_eq!(plan_arrows(&equator_route(11, 300.0), 2500.0).len(), 2);
    // 6000 m: two midpoint arrows, one final arrow
    assert_eq!(plan_arrows(&equator_route(21, 300.0), 2500.0).len(), 3);
}

#[test]
fn test_at_least_one_arrow_for_any_spacing() {
    let route = sample_route();
    for spacing in [0.5, 100.0, 2500.0, 1.0e6, f64::INFINITY] {
        assert!(!plan_arrows(&route, spacing).is_empty(), "spacing {}", spacing);
    }
}

#[test]
fn test_short_routes_have_no_arrows() {
    assert!(plan_arrows(&Route::default(), 2500.0).is_empty());
    assert!(plan_arrows(&Route::new(vec![Coordinate::new(28.6, 77.2)]), 2500.0).is_empty());
}

#[test]
fn test_markers_are_offset_north_only() {
    let route = equator_route(21, 300.0);
    let arrows = plan_arrows(&route, 1000.0);

    for arrow in &arrows {
        let lat = arrow.position.latitude - DEFAULT_ARROW_LAT_OFFSET;
        assert!(lat.abs() < 1e-12);
    }

    let last = arrows.last().unwrap();
    assert_eq!(last.position.longitude, route.last().unwrap().longitude);
}

#[test]
fn test_midpoint_arrow_sits_on_segment_midpoint() {
    let route = equator_route(11, 300.0);
    let arrows = ArrowPlanner::new(2500.0).with_lat_offset(0.0).plan(&route);

    // Threshold crossed on the ninth segment (points 8 and 9)
    let expected = route.points()[8].midpoint(&route.points()[9]);
    assert_eq!(arrows[0].position, expected);
}

#[test]
fn test_huge_spacing_leaves_final_marker_only() {
    let arrows = plan_arrows(&sample_route(), 1.0e9);

    assert_eq!(arrows.len(), 1);
    let marker = &arrows[0];
    assert!((marker.position.latitude - (28.62 + DEFAULT_ARROW_LAT_OFFSET)).abs() < 1e-12);
    assert_eq!(marker.position.longitude, 77.22);

    let expected = heading(&sample_route(), 2).unwrap();
    assert_eq!(marker.heading_degrees, expected);
    assert!((marker.heading_degrees - 45.0).abs() < 1e-6);
}

#[test]
fn test_sample_route_at_default_spacing() {
    // Each segment is about 1480 m, so the threshold is crossed on the second
    let arrows = plan_arrows(&sample_route(), 2500.0);

    assert_eq!(arrows.len(), 2);
    let midpoint = &arrows[0];
    assert!((midpoint.position.latitude - 28.6151).abs() < 1e-9);
    assert!((midpoint.position.longitude - 77.215).abs() < 1e-9);
    assert_eq!(midpoint.heading_degrees, heading(&sample_route(), 2).unwrap());

    let last = &arrows[1];
    assert!((last.position.latitude - 28.6201).abs() < 1e-9);
    assert_eq!(last.position.longitude, 77.22);
}

#[test]
fn test_legacy_heading_scale_doubles_headings() {
    let route = sample_route();
    let degrees = ArrowPlanner::new(2500.0).plan(&route);
    let legacy = ArrowPlanner::new(2500.0)
        .with_heading_scale(HeadingScale::Legacy)
        .plan(&route);

    assert_eq!(degrees.len(), legacy.len());
    for (d, l) in degrees.iter().zip(&legacy) {
        assert!((l.heading_degrees - 2.0 * d.heading_degrees).abs() < 1e-9);
        assert_eq!(d.position, l.position);
    }
}
