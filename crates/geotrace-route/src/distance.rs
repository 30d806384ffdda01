use geotrace_model::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_TO_MILES: f64 = 0.621371;

/// Great-circle distance in miles.
///
/// Kilometres are rounded to two places before the mile conversion, and the
/// miles are rounded again.
pub fn haversine_miles(origin: Coordinate, destination: Coordinate) -> f64 {
    let lat1 = origin.latitude.to_radians();
    let lat2 = destination.latitude.to_radians();
    let dlat = (destination.latitude - origin.latitude).to_radians();
    let dlon = (destination.longitude - origin.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    let km = round2(EARTH_RADIUS_KM * c);
    round2(km * KM_TO_MILES)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
