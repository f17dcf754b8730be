//! Smallest enclosing circle over a set of geographic points (Welzl's algorithm).
//!
//! The construction runs in a local equirectangular plane measured in kilometres and centred
//! on the input, which is accurate for regions spanning tens of kilometres. It is not a
//! spherical solution and should not be used for ocean-basin sized point sets.

use crate::math::geo::{GeoHelper, EARTH_RADIUS_KM};
use crate::math::stats::StatsHelper;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const CONTAINMENT_EPSILON_KM: f64 = 1e-6;
const COLLINEAR_EPSILON: f64 = 1e-9;

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Circle on the Earth's surface, radius in kilometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
}

impl Circle {
    pub fn new(center_lat: f64, center_lon: f64, radius_km: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            radius_km,
        }
    }

    /// Great-circle containment test, boundary inclusive.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        GeoHelper::distance_km(self.center_lat, self.center_lon, lat, lon) <= self.radius_km
    }
}

pub struct EnclosingCircle;

impl EnclosingCircle {
    /// Smallest circle covering every point, using a thread-local RNG for the shuffle.
    pub fn compute(points: &[GeoPoint]) -> Circle {
        Self::compute_with_rng(points, &mut rand::thread_rng())
    }

    /// Smallest circle covering every point.
    ///
    /// The input is copied and shuffled with `rng`, which keeps the expected running time
    /// linear. An empty input yields a zero-radius circle at (0, 0). The reported center is
    /// rounded to 6 decimals and the radius is the largest great-circle distance from that
    /// center to any input point, rounded up to 4 decimals, so every point stays covered.
    pub fn compute_with_rng<R: Rng + ?Sized>(points: &[GeoPoint], rng: &mut R) -> Circle {
        if points.is_empty() {
            return Circle::new(0.0, 0.0, 0.0);
        }

        let plane = LocalPlane::around(points);
        let mut projected: Vec<PlanePoint> = points.iter().map(|&p| plane.project(p)).collect();
        projected.shuffle(rng);

        let planar = welzl(&projected);
        let center = plane.unproject(planar.center);

        let center_lat = StatsHelper::round_to(center.lat, 6);
        let center_lon = StatsHelper::round_to(center.lon, 6);
        let radius = points
            .iter()
            .map(|p| GeoHelper::distance_km(center_lat, center_lon, p.lat, p.lon))
            .fold(0.0_f64, f64::max);

        Circle::new(center_lat, center_lon, (radius * 1e4).ceil() / 1e4)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PlanePoint {
    x: f64,
    y: f64,
}

impl PlanePoint {
    fn distance(&self, other: &PlanePoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy)]
struct PlaneCircle {
    center: PlanePoint,
    radius: f64,
}

impl PlaneCircle {
    fn contains(&self, p: &PlanePoint) -> bool {
        self.center.distance(p) <= self.radius + CONTAINMENT_EPSILON_KM
    }

    fn from_diameter(a: PlanePoint, b: PlanePoint) -> Self {
        Self {
            center: PlanePoint {
                x: (a.x + b.x) / 2.0,
                y: (a.y + b.y) / 2.0,
            },
            radius: a.distance(&b) / 2.0,
        }
    }

    fn circumscribe(a: PlanePoint, b: PlanePoint, c: PlanePoint) -> Self {
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));

        if d.abs() < COLLINEAR_EPSILON {
            // Collinear: the longest edge is the diameter.
            let (ab, bc, ca) = (a.distance(&b), b.distance(&c), c.distance(&a));
            return if ab >= bc && ab >= ca {
                Self::from_diameter(a, b)
            } else if bc >= ab && bc >= ca {
                Self::from_diameter(b, c)
            } else {
                Self::from_diameter(c, a)
            };
        }

        let (a2, b2, c2) = (
            a.x * a.x + a.y * a.y,
            b.x * b.x + b.y * b.y,
            c.x * c.x + c.y * c.y,
        );
        let center = PlanePoint {
            x: (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
            y: (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
        };

        Self {
            center,
            radius: center.distance(&a),
        }
    }
}

/// Move-to-front Welzl over an already shuffled slice, iterative so depth stays constant.
fn welzl(points: &[PlanePoint]) -> PlaneCircle {
    let Some(&first) = points.first() else {
        return PlaneCircle {
            center: PlanePoint::default(),
            radius: 0.0,
        };
    };

    let mut circle = PlaneCircle {
        center: first,
        radius: 0.0,
    };
    for (i, &p) in points.iter().enumerate().skip(1) {
        if circle.contains(&p) {
            continue;
        }
        circle = PlaneCircle {
            center: p,
            radius: 0.0,
        };
        for (j, &q) in points[..i].iter().enumerate() {
            if circle.contains(&q) {
                continue;
            }
            circle = PlaneCircle::from_diameter(p, q);
            for &r in &points[..j] {
                if !circle.contains(&r) {
                    circle = PlaneCircle::circumscribe(p, q, r);
                }
            }
        }
    }
    circle
}

/// Equirectangular projection around the mean of a point set. Longitudes are unwrapped
/// relative to the first point so sets straddling the antimeridian stay contiguous.
struct LocalPlane {
    lat0: f64,
    lon0: f64,
    km_per_rad_lon: f64,
}

impl LocalPlane {
    fn around(points: &[GeoPoint]) -> Self {
        let n = points.len() as f64;
        let lat0 = points.iter().map(|p| p.lat).sum::<f64>() / n;
        let origin = points.first().map_or(0.0, |p| p.lon);
        let lon0 = wrap_lon(
            origin + points.iter().map(|p| wrap_lon(p.lon - origin)).sum::<f64>() / n,
        );
        let km_per_rad_lon = (EARTH_RADIUS_KM * lat0.to_radians().cos()).max(f64::EPSILON);

        Self {
            lat0,
            lon0,
            km_per_rad_lon,
        }
    }

    fn project(&self, p: GeoPoint) -> PlanePoint {
        PlanePoint {
            x: wrap_lon(p.lon - self.lon0).to_radians() * self.km_per_rad_lon,
            y: (p.lat - self.lat0).to_radians() * EARTH_RADIUS_KM,
        }
    }

    fn unproject(&self, p: PlanePoint) -> GeoPoint {
        GeoPoint {
            lat: self.lat0 + (p.y / EARTH_RADIUS_KM).to_degrees(),
            lon: wrap_lon(self.lon0 + (p.x / self.km_per_rad_lon).to_degrees()),
        }
    }
}

/// Folds a longitude or longitude difference into [-180, 180).
fn wrap_lon(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}
