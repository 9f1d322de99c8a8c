// Geo Engine - Great-circle distance and nearby-complaint filtering
// Pure computation: no storage access, no mutation of inputs

use serde::{Deserialize, Serialize};

use crate::db::Complaint;

/// Earth radius in kilometers (haversine)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default search radius for "nearby" queries, in kilometers
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

// ============================================================================
// GEO POINT
// ============================================================================

/// A geographic coordinate pair in degrees
///
/// Latitude is expected in -90..90, longitude in -180..180. Values are
/// validated at the intake boundary (see `validation`), not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }
}

// ============================================================================
// DISTANCE
// ============================================================================

/// Great-circle distance between two points in kilometers (haversine formula)
///
/// Returns 0.0 for identical points. All trigonometry is done in radians.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

// ============================================================================
// BOUNDING BOX PREFILTER
// ============================================================================

/// Latitude/longitude window around a center point
///
/// Cheap rectangular prefilter: every point within `radius_km` of the center
/// falls inside the box, but not every point inside the box is within the
/// radius. Candidates still go through the exact haversine test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Compute a bounding box that contains the full radius around `center`
pub fn bounding_box(center: GeoPoint, radius_km: f64) -> BoundingBox {
    // One degree of latitude is ~111.19 km everywhere; longitude degrees
    // shrink with cos(latitude).
    let lat_delta = radius_km / (EARTH_RADIUS_KM.to_radians());
    let lng_scale = center.lat.to_radians().cos().abs().max(1e-9);
    let lng_delta = lat_delta / lng_scale;

    BoundingBox {
        min_lat: center.lat - lat_delta,
        max_lat: center.lat + lat_delta,
        min_lng: center.lng - lng_delta,
        max_lng: center.lng + lng_delta,
    }
}

/// Check whether a point falls inside a bounding box (inclusive edges)
pub fn within_bounding_box(point: GeoPoint, bbox: &BoundingBox) -> bool {
    point.lat >= bbox.min_lat
        && point.lat <= bbox.max_lat
        && point.lng >= bbox.min_lng
        && point.lng <= bbox.max_lng
}

// ============================================================================
// PROXIMITY QUERY
// ============================================================================

/// Filter complaints to those within `radius_km` of `center`
///
/// Complaints without coordinates are skipped (an expected case: many
/// submissions carry only a street address). The radius test is inclusive
/// and results keep the relative order of the input slice.
pub fn nearby_complaints(
    complaints: &[Complaint],
    center: GeoPoint,
    radius_km: f64,
) -> Vec<Complaint> {
    let bbox = bounding_box(center, radius_km);

    complaints
        .iter()
        .filter(|complaint| match complaint.coordinates {
            Some(point) => {
                within_bounding_box(point, &bbox)
                    && haversine_distance(center, point) <= radius_km
            }
            None => false,
        })
        .cloned()
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewComplaint;

    fn complaint_at(title: &str, coordinates: Option<GeoPoint>) -> Complaint {
        Complaint::from_new(NewComplaint {
            title: title.to_string(),
            description: "test complaint".to_string(),
            department: "Transportation".to_string(),
            category: "Road Maintenance".to_string(),
            priority: crate::db::Priority::Medium,
            citizen_id: "citizen-1".to_string(),
            citizen_name: "Test Citizen".to_string(),
            address: None,
            coordinates,
            attachments: vec![],
        })
    }

    #[test]
    fn test_distance_identical_points_is_zero() {
        let p = GeoPoint::new(39.7392, -104.9903);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn test_distance_symmetry() {
        let a = GeoPoint::new(39.7392, -104.9903);
        let b = GeoPoint::new(40.7128, -74.0060);

        let ab = haversine_distance(a, b);
        let ba = haversine_distance(b, a);

        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_of_longitude_at_equator() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);

        let d = haversine_distance(a, b);

        // One degree along the equator is ~111.19 km
        assert!((d - 111.19).abs() / 111.19 < 0.005, "distance was {}", d);
    }

    #[test]
    fn test_distance_downtown_fixture() {
        // Two points ~0.27 km apart in downtown Denver
        let a = GeoPoint::new(39.7392, -104.9903);
        let b = GeoPoint::new(39.7412, -104.9923);

        let d = haversine_distance(a, b);

        assert!(d > 0.2 && d < 0.35, "distance was {}", d);
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let center = GeoPoint::new(39.7392, -104.9903);
        let bbox = bounding_box(center, 5.0);

        // Points just inside the radius must be inside the box
        let near = GeoPoint::new(39.7412, -104.9923);
        assert!(within_bounding_box(near, &bbox));

        // A point far outside must be rejected by the box alone
        let far = GeoPoint::new(40.7128, -74.0060);
        assert!(!within_bounding_box(far, &bbox));
    }

    #[test]
    fn test_nearby_inclusive_radius() {
        let center = GeoPoint::new(0.0, 0.0);
        let on_edge = GeoPoint::new(0.0, 1.0);
        let edge_distance = haversine_distance(center, on_edge);

        let complaints = vec![complaint_at("edge", Some(on_edge))];

        // Radius exactly at the distance keeps the record (<=, not <)
        let hits = nearby_complaints(&complaints, center, edge_distance);
        assert_eq!(hits.len(), 1);

        let misses = nearby_complaints(&complaints, center, edge_distance - 0.01);
        assert_eq!(misses.len(), 0);
    }

    #[test]
    fn test_nearby_skips_complaints_without_coordinates() {
        let center = GeoPoint::new(39.7392, -104.9903);

        let complaints = vec![
            complaint_at("no location", None),
            complaint_at("at center", Some(center)),
        ];

        let hits = nearby_complaints(&complaints, center, 100.0);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "at center");
    }

    #[test]
    fn test_nearby_monotone_in_radius() {
        let center = GeoPoint::new(39.7392, -104.9903);

        let complaints = vec![
            complaint_at("close", Some(GeoPoint::new(39.7412, -104.9923))),
            complaint_at("mid", Some(GeoPoint::new(39.80, -104.99))),
            complaint_at("far", Some(GeoPoint::new(40.0, -105.3))),
        ];

        let mut previous = 0;
        for radius in [0.1, 1.0, 10.0, 100.0] {
            let hits = nearby_complaints(&complaints, center, radius);
            assert!(hits.len() >= previous, "radius {} lost records", radius);
            previous = hits.len();
        }
    }

    #[test]
    fn test_nearby_preserves_input_order() {
        let center = GeoPoint::new(39.7392, -104.9903);

        let complaints = vec![
            complaint_at("first", Some(GeoPoint::new(39.7412, -104.9923))),
            complaint_at("second", Some(center)),
            complaint_at("third", Some(GeoPoint::new(39.7400, -104.9910))),
        ];

        let hits = nearby_complaints(&complaints, center, 5.0);

        let titles: Vec<&str> = hits.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_nearby_downtown_scenario() {
        // City-hall graffiti report and a park-bench report ~0.27 km apart
        let city_hall = GeoPoint::new(39.7392, -104.9903);
        let park = GeoPoint::new(39.7412, -104.9923);

        let complaints = vec![
            complaint_at("Graffiti on Public Building", Some(city_hall)),
            complaint_at("Park Bench Needs Repair", Some(park)),
        ];

        let wide = nearby_complaints(&complaints, city_hall, 1.0);
        assert_eq!(wide.len(), 2);

        let tight = nearby_complaints(&complaints, city_hall, 0.1);
        assert_eq!(tight.len(), 1);
        assert_eq!(tight[0].title, "Graffiti on Public Building");
    }
}
