/// Mean Earth radius used by every distance in the crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_PER_NM: f64 = 1.852;

pub struct GeoHelper;

impl GeoHelper {
    /// Haversine great-circle distance in kilometres between two points given in degrees.
    ///
    /// NaN inputs propagate to a NaN distance.
    pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        let d_lat = (lat2 - lat1).to_radians();
        let d_lon = (lon2 - lon1).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Absolute difference between two headings, wrapped into `[0, 180]`.
    pub fn angle_diff(a: f64, b: f64) -> f64 {
        let diff = (a - b).abs() % 360.0;
        if diff > 180.0 {
            360.0 - diff
        } else {
            diff
        }
    }
}
