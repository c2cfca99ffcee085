use geo::{Distance, Euclidean};
use serde::Serialize;

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// Distances and times share one integer scale: one input unit is 1000
/// milli-units, which keeps arithmetic exact.
pub const MILLI_UNITS: f64 = 1000.0;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Location {
    external_id: u64,
    point: geo::Point,
}

impl Location {
    pub fn from_cartesian(external_id: u64, x: f64, y: f64) -> Self {
        Self {
            external_id,
            point: geo::Point::new(x, y),
        }
    }

    pub fn external_id(&self) -> u64 {
        self.external_id
    }

    pub fn euclidean_distance(&self, to: &Location) -> f64 {
        Euclidean.distance(self.point, to.point)
    }

    /// Euclidean distance in milli-units, rounded half up.
    pub fn distance_millis(&self, to: &Location) -> i64 {
        (self.euclidean_distance(to) * MILLI_UNITS + 0.5) as i64
    }
}
