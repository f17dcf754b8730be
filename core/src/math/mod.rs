pub mod circle;
pub mod geo;
pub mod stats;

pub use circle::{Circle, EnclosingCircle, GeoPoint};
pub use geo::GeoHelper;
pub use stats::StatsHelper;
