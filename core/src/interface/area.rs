use crate::math::circle::GeoPoint;
use crate::math::geo::GeoHelper;
use serde::{Deserialize, Serialize};

/// Operator-managed circular geofence around a known smuggling route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmugglingArea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
}

impl SmugglingArea {
    pub fn new(center_lat: f64, center_lon: f64, radius_km: f64) -> Self {
        Self {
            name: None,
            center_lat,
            center_lon,
            radius_km,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_lat, self.center_lon)
    }

    /// Boundary-inclusive containment by great-circle distance.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        GeoHelper::distance_km(lat, lon, self.center_lat, self.center_lon) <= self.radius_km
    }
}
