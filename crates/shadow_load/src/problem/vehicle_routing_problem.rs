use serde::Serialize;

use super::{
    depot::{Depot, DepotIdx},
    location::{Location, LocationIdx},
    stop::{Demand, Stop, StopIdx},
    time_window::DueTimeCorrection,
    vehicle::{Vehicle, VehicleIdx},
};

/// A due time lowered at import because the stop could not be served and
/// still reach its depot before closing.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DueTimeWarning {
    pub stop_external_id: u64,
    pub correction: DueTimeCorrection,
}

/// The static part of an instance: everything that does not change while
/// chains are re-linked.
#[derive(Debug)]
pub struct VehicleRoutingProblem {
    name: String,
    locations: Vec<Location>,
    depots: Vec<Depot>,
    vehicles: Vec<Vehicle>,
    stops: Vec<Stop>,
    warnings: Vec<DueTimeWarning>,
}

impl VehicleRoutingProblem {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: LocationIdx) -> &Location {
        &self.locations[location_id]
    }

    pub fn depots(&self) -> &[Depot] {
        &self.depots
    }

    pub fn depot(&self, depot_id: DepotIdx) -> &Depot {
        &self.depots[depot_id]
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn vehicle_ids(&self) -> impl Iterator<Item = VehicleIdx> + use<> {
        (0..self.vehicles.len()).map(VehicleIdx::new)
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop(&self, stop_id: StopIdx) -> &Stop {
        &self.stops[stop_id]
    }

    pub fn stop_ids(&self) -> impl Iterator<Item = StopIdx> + use<> {
        (0..self.stops.len()).map(StopIdx::new)
    }

    pub fn demand(&self, stop_id: StopIdx) -> Demand {
        self.stops[stop_id].demand()
    }

    pub fn total_demand(&self) -> Demand {
        self.stops.iter().map(Stop::demand).sum()
    }

    pub fn total_capacity(&self) -> Demand {
        self.vehicles.iter().map(Vehicle::capacity).sum()
    }

    pub fn warnings(&self) -> &[DueTimeWarning] {
        &self.warnings
    }

    pub fn random_vehicle<R>(&self, rng: &mut R) -> Option<VehicleIdx>
    where
        R: rand::Rng,
    {
        if self.vehicles.is_empty() {
            return None;
        }

        Some(rng.random_range(0..self.vehicles.len()).into())
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    name: Option<String>,
    locations: Option<Vec<Location>>,
    depots: Option<Vec<Depot>>,
    vehicles: Option<Vec<Vehicle>>,
    stops: Option<Vec<Stop>>,
    warnings: Vec<DueTimeWarning>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_name(&mut self, name: String) -> &mut VehicleRoutingProblemBuilder {
        self.name = Some(name);
        self
    }

    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut VehicleRoutingProblemBuilder {
        self.locations = Some(locations);
        self
    }

    pub fn set_depots(&mut self, depots: Vec<Depot>) -> &mut VehicleRoutingProblemBuilder {
        self.depots = Some(depots);
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut VehicleRoutingProblemBuilder {
        self.vehicles = Some(vehicles);
        self
    }

    pub fn set_stops(&mut self, stops: Vec<Stop>) -> &mut VehicleRoutingProblemBuilder {
        self.stops = Some(stops);
        self
    }

    pub fn add_warning(&mut self, warning: DueTimeWarning) -> &mut VehicleRoutingProblemBuilder {
        self.warnings.push(warning);
        self
    }

    pub fn build(self) -> VehicleRoutingProblem {
        VehicleRoutingProblem {
            name: self.name.unwrap_or_default(),
            locations: self.locations.unwrap_or_default(),
            depots: self.depots.unwrap_or_default(),
            vehicles: self.vehicles.unwrap_or_default(),
            stops: self.stops.unwrap_or_default(),
            warnings: self.warnings,
        }
    }
}
