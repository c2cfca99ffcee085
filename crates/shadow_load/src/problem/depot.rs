use serde::Serialize;

use crate::define_index_newtype;

use super::{location::LocationIdx, time_window::TimeWindow};

define_index_newtype!(DepotIdx, Depot);

#[derive(Serialize, Debug, Clone)]
pub struct Depot {
    external_id: u64,
    location_id: LocationIdx,
    time_window: TimeWindow,
}

impl Depot {
    pub fn new(external_id: u64, location_id: LocationIdx, time_window: TimeWindow) -> Self {
        Depot {
            external_id,
            location_id,
            time_window,
        }
    }

    pub fn external_id(&self) -> u64 {
        self.external_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }
}
