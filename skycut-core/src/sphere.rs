//! Great-circle geometry on the unit sphere.
//!
//! Longitudes and latitudes are [`Angle`]s. Position angles follow the astronomical
//! convention: measured from north through east.
//!
//! ```
//! use skycut_core::sphere::{angular_separation, directional_offset, position_angle};
//! use skycut_core::Angle;
//!
//! let (lon1, lat1) = (Angle::from_degrees(10.0), Angle::from_degrees(5.0));
//! let (lon2, lat2) = (Angle::from_degrees(12.0), Angle::from_degrees(-3.0));
//!
//! let pa = position_angle(lon1, lat1, lon2, lat2);
//! let sep = angular_separation(lon1, lat1, lon2, lat2);
//! let (lon, lat) = directional_offset(lon1, lat1, pa, sep);
//! assert!((lon.degrees() - 12.0).abs() < 1e-10);
//! assert!((lat.degrees() + 3.0).abs() < 1e-10);
//! ```

use crate::angle::Angle;
use crate::math::vincenty_angular_separation;

/// Angular distance between two points (Vincenty formula, stable at all separations).
pub fn angular_separation(lon1: Angle, lat1: Angle, lon2: Angle, lat2: Angle) -> Angle {
    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_lat2, cos_lat2) = lat2.sin_cos();
    Angle::from_radians(vincenty_angular_separation(
        sin_lat1,
        cos_lat1,
        sin_lat2,
        cos_lat2,
        (lon2 - lon1).radians(),
    ))
}

/// Position angle of point 2 as seen from point 1, east of north, in [0, 2π).
pub fn position_angle(lon1: Angle, lat1: Angle, lon2: Angle, lat2: Angle) -> Angle {
    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_lat2, cos_lat2) = lat2.sin_cos();
    let (sin_dlon, cos_dlon) = (lon2 - lon1).sin_cos();

    let x = sin_dlon * cos_lat2;
    let y = cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon;
    Angle::from_radians(libm::atan2(x, y)).wrapped()
}

/// Point reached by travelling `distance` along the great circle leaving
/// (`lon`, `lat`) at `position_angle`.
///
/// The returned longitude is wrapped into [0, 2π).
pub fn directional_offset(
    lon: Angle,
    lat: Angle,
    position_angle: Angle,
    distance: Angle,
) -> (Angle, Angle) {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_d, cos_d) = distance.sin_cos();
    let (sin_pa, cos_pa) = position_angle.sin_cos();

    let sin_lat2 = (sin_lat * cos_d + cos_lat * sin_d * cos_pa).clamp(-1.0, 1.0);
    let lat2 = libm::asin(sin_lat2);

    let x = sin_pa * sin_d * cos_lat;
    let y = cos_d - sin_lat * sin_lat2;
    let lon2 = lon.radians() + libm::atan2(x, y);

    (
        Angle::from_radians(lon2).wrapped(),
        Angle::from_radians(lat2),
    )
}

/// Midpoint of the great-circle arc between two points.
pub fn great_circle_midpoint(lon1: Angle, lat1: Angle, lon2: Angle, lat2: Angle) -> (Angle, Angle) {
    let pa = position_angle(lon1, lat1, lon2, lat2);
    let sep = angular_separation(lon1, lat1, lon2, lat2);
    directional_offset(lon1, lat1, pa, sep / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deg(v: f64) -> Angle {
        Angle::from_degrees(v)
    }

    #[test]
    fn test_separation_along_meridian() {
        let sep = angular_separation(deg(30.0), deg(10.0), deg(30.0), deg(25.0));
        assert!((sep.degrees() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_separation_across_zero_longitude() {
        let sep = angular_separation(deg(359.5), deg(0.0), deg(0.5), deg(0.0));
        assert!((sep.degrees() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_position_angle_cardinal_directions() {
        let north = position_angle(deg(50.0), deg(0.0), deg(50.0), deg(1.0));
        let east = position_angle(deg(50.0), deg(0.0), deg(51.0), deg(0.0));
        let south = position_angle(deg(50.0), deg(0.0), deg(50.0), deg(-1.0));
        let west = position_angle(deg(50.0), deg(0.0), deg(49.0), deg(0.0));
        assert!(north.degrees().abs() < 1e-12);
        assert!((east.degrees() - 90.0).abs() < 1e-12);
        assert!((south.degrees() - 180.0).abs() < 1e-12);
        assert!((west.degrees() - 270.0).abs() < 1e-12);
    }

    #[test]
    fn test_offset_north_from_equator() {
        let (lon, lat) = directional_offset(deg(100.0), deg(0.0), deg(0.0), deg(20.0));
        assert!((lon.degrees() - 100.0).abs() < 1e-12);
        assert!((lat.degrees() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_offset_wraps_longitude() {
        let (lon, lat) = directional_offset(deg(359.0), deg(0.0), deg(90.0), deg(2.0));
        assert!((lon.degrees() - 1.0).abs() < 1e-10);
        assert!(lat.degrees().abs() < 1e-12);
    }

    #[test]
    fn test_midpoint_is_equidistant() {
        let (p1, q1) = (deg(150.0), deg(2.3));
        let (p2, q2) = (deg(150.2), deg(2.1));
        let (m_lon, m_lat) = great_circle_midpoint(p1, q1, p2, q2);
        let d1 = angular_separation(p1, q1, m_lon, m_lat);
        let d2 = angular_separation(p2, q2, m_lon, m_lat);
        assert!((d1.degrees() - d2.degrees()).abs() < 1e-12);
        assert!((m_lon.degrees() - 150.1).abs() < 1e-4);
        assert!((m_lat.degrees() - 2.2).abs() < 1e-4);
    }
}
