//! Cálculos geográficos
//!
//! Distancia de gran círculo (haversine) en metros, sin componente de altitud.

use crate::models::vehicle::Coordinates;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distancia haversine entre dos coordenadas, en metros
pub fn haversine_distance(from: Coordinates, to: Coordinates) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();

    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Distancia al centro y si el punto cae dentro del círculo (el borde cuenta)
pub fn circle_containment(point: Coordinates, center: Coordinates, radius_meters: f64) -> (f64, bool) {
    let distance = haversine_distance(point, center);
    (distance, distance <= radius_meters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let bangkok = Coordinates::new(13.7244, 100.5332);
        assert_eq!(haversine_distance(bangkok, bangkok), 0.0);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = haversine_distance(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0));
        let expected = 111_195.0;
        assert!((d - expected).abs() / expected < 0.005, "distance was {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(13.7563, 100.5018);
        let b = Coordinates::new(13.7244, 100.5332);
        let ab = haversine_distance(a, b);
        let ba = haversine_distance(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_boundary_counts_as_inside() {
        let center = Coordinates::new(0.0, 0.0);
        let point = Coordinates::new(0.0, 0.001);
        let d = haversine_distance(point, center);
        assert_eq!(circle_containment(point, center, d), (d, true));
        assert!(!circle_containment(point, center, d - 0.01).1);
    }
}
