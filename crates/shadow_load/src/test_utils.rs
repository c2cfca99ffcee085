use jiff::SignedDuration;

use crate::problem::{
    depot::Depot,
    location::{Location, LocationIdx},
    stop::{Demand, Stop, StopBuilder, StopIdx},
    time_window::TimeWindow,
    vehicle::{Vehicle, VehicleBuilder, VehicleIdx},
    vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
};

pub fn s(index: usize) -> StopIdx {
    StopIdx::new(index)
}

pub fn v(index: usize) -> VehicleIdx {
    VehicleIdx::new(index)
}

pub fn create_locations(count: usize) -> Vec<Location> {
    (0..count)
        .map(|index| Location::from_cartesian(index as u64, index as f64, 0.0))
        .collect()
}

pub fn create_stops(demands: &[Demand]) -> Vec<Stop> {
    demands
        .iter()
        .enumerate()
        .map(|(index, &demand)| {
            let mut builder = StopBuilder::default();
            builder
                .set_external_id(index as u64 + 1)
                .set_location_id(index + 1)
                .set_demand(demand);
            builder.build()
        })
        .collect()
}

pub fn create_vehicles(capacities: &[Demand]) -> Vec<Vehicle> {
    capacities
        .iter()
        .enumerate()
        .map(|(index, &capacity)| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_external_id(index as u64)
                .set_capacity(capacity)
                .set_depot_id(0);
            builder.build()
        })
        .collect()
}

/// One depot at the origin, one vehicle per capacity and one stop per
/// demand, laid out on a line.
pub fn build_problem(capacities: &[Demand], demands: &[Demand]) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_name(String::from("test"))
        .set_locations(create_locations(demands.len() + 1))
        .set_depots(vec![Depot::new(
            0,
            LocationIdx::new(0),
            TimeWindow::new(SignedDuration::ZERO, SignedDuration::from_secs(1000)),
        )])
        .set_vehicles(create_vehicles(capacities))
        .set_stops(create_stops(demands));

    builder.build()
}
