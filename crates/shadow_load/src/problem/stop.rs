use jiff::SignedDuration;
use serde::Serialize;

use crate::define_index_newtype;

use super::{location::LocationIdx, time_window::TimeWindow};

define_index_newtype!(StopIdx, Stop);

/// Demand of a single stop and the aggregate demand of a vehicle.
pub type Demand = i64;

/// A customer visit. Stops are created once at import and only re-linked
/// afterwards.
#[derive(Serialize, Debug, Clone)]
pub struct Stop {
    external_id: u64,
    location_id: LocationIdx,
    demand: Demand,
    time_window: Option<TimeWindow>,
    service_duration: SignedDuration,
}

impl Stop {
    pub fn external_id(&self) -> u64 {
        self.external_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn demand(&self) -> Demand {
        self.demand
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    pub fn service_duration(&self) -> SignedDuration {
        self.service_duration
    }
}

#[derive(Default)]
pub struct StopBuilder {
    external_id: Option<u64>,
    location_id: Option<usize>,
    demand: Option<Demand>,
    time_window: Option<TimeWindow>,
    service_duration: Option<SignedDuration>,
}

impl StopBuilder {
    pub fn set_external_id(&mut self, external_id: u64) -> &mut StopBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_location_id(&mut self, location_id: usize) -> &mut StopBuilder {
        self.location_id = Some(location_id);
        self
    }

    pub fn set_demand(&mut self, demand: Demand) -> &mut StopBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut StopBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn set_service_duration(&mut self, duration: SignedDuration) -> &mut StopBuilder {
        self.service_duration = Some(duration);
        self
    }

    pub fn build(self) -> Stop {
        Stop {
            external_id: self.external_id.unwrap_or_default(),
            location_id: self.location_id.unwrap_or_default().into(),
            demand: self.demand.unwrap_or_default(),
            time_window: self.time_window,
            service_duration: self.service_duration.unwrap_or(SignedDuration::ZERO),
        }
    }
}
