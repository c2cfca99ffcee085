use serde::Serialize;

use crate::problem::{
    stop::{Demand, StopIdx},
    vehicle::VehicleIdx,
};

/// Per-vehicle `current_demand` plus, per stop, the vehicle whose aggregate
/// currently counts that stop.
///
/// Writes are raw: the store never validates and never notifies. Both are
/// the propagator's job.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DemandStore {
    current_demand: Vec<Demand>,
    attribution: Vec<Option<VehicleIdx>>,
}

impl DemandStore {
    pub fn new(num_stops: usize, num_vehicles: usize) -> Self {
        Self {
            current_demand: vec![0; num_vehicles],
            attribution: vec![None; num_stops],
        }
    }

    #[inline]
    pub fn get(&self, vehicle: VehicleIdx) -> Demand {
        self.current_demand[vehicle.get()]
    }

    #[inline]
    pub fn set(&mut self, vehicle: VehicleIdx, value: Demand) {
        self.current_demand[vehicle.get()] = value;
    }

    #[inline]
    pub fn attribution(&self, stop: StopIdx) -> Option<VehicleIdx> {
        self.attribution[stop.get()]
    }

    /// Records `vehicle` as the aggregate counting `stop` and returns the
    /// previous one.
    #[inline]
    pub fn attribute(&mut self, stop: StopIdx, vehicle: Option<VehicleIdx>) -> Option<VehicleIdx> {
        std::mem::replace(&mut self.attribution[stop.get()], vehicle)
    }

    pub fn total(&self) -> Demand {
        self.current_demand.iter().sum()
    }

    pub fn reset(&mut self) {
        self.current_demand.fill(0);
        self.attribution.fill(None);
    }
}
