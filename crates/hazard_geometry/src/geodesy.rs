//! Great-circle distance and point offset on a spherical earth.
//!
//! Points are `geo_types::Point` with `x` = longitude and `y` = latitude, in
//! degrees. Distances are in the supplied [`LinearUnit`].

use std::f64::consts::{FRAC_PI_2, PI};

use geo_types::Point;

use crate::units::LinearUnit;

/// Great-circle distance between two points, in `unit`.
///
/// Uses the half-angle (haversine) form so that short ranges keep their
/// precision.
pub fn distance(unit: LinearUnit, p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (p2.x() - p1.x()).to_radians();

    let a = (d_lat * 0.5).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
    let central_angle = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    unit.earth_radius() * central_angle
}

/// Point reached by travelling `magnitude` (in `unit`) from `origin` along
/// `direction_radians`, measured counterclockwise from east.
///
/// The latitude term goes through `asin`, so its argument is clamped to
/// `[-1, 1]` to absorb rounding overshoot near the poles.
pub fn offset(
    unit: LinearUnit,
    origin: Point<f64>,
    magnitude: f64,
    direction_radians: f64,
) -> Point<f64> {
    let angular_distance = magnitude / unit.earth_radius();
    // Counterclockwise-from-east to clockwise-from-north.
    let bearing = FRAC_PI_2 - direction_radians;

    let lat1 = origin.y().to_radians();
    let lon1 = origin.x().to_radians();

    let sin_lat2 = (lat1.sin() * angular_distance.cos()
        + lat1.cos() * angular_distance.sin() * bearing.cos())
    .clamp(-1.0, 1.0);
    let lat2 = sin_lat2.asin();

    let d_lon = (bearing.sin() * angular_distance.sin() * lat1.cos())
        .atan2(angular_distance.cos() - lat1.sin() * sin_lat2);

    Point::new(normalize_longitude(lon1 + d_lon).to_degrees(), lat2.to_degrees())
}

fn normalize_longitude(lon: f64) -> f64 {
    (lon + PI).rem_euclid(2.0 * PI) - PI
}
