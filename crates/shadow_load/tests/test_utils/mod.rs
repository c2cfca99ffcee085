#![allow(dead_code)]

use std::sync::Arc;

use jiff::SignedDuration;
use shadow_load::{
    problem::{
        depot::Depot,
        location::{Location, LocationIdx},
        standstill::Standstill,
        stop::{Demand, Stop, StopBuilder, StopIdx},
        time_window::TimeWindow,
        vehicle::{Vehicle, VehicleBuilder, VehicleIdx},
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        moves::Move,
        notifier::{Entity, Field, NoopNotifier, NotificationLog, Phase},
        working_solution::WorkingSolution,
    },
};

pub fn s(index: usize) -> StopIdx {
    StopIdx::new(index)
}

pub fn v(index: usize) -> VehicleIdx {
    VehicleIdx::new(index)
}

//
//  Depot at the origin, stop `i` at (i + 1, 0):
//
//  D --- s0 --- s1 --- s2 --- ... ---> X-axis
//
pub fn create_test_problem(capacities: &[Demand], demands: &[Demand]) -> VehicleRoutingProblem {
    let locations = (0..=demands.len())
        .map(|index| Location::from_cartesian(index as u64, index as f64, 0.0))
        .collect::<Vec<_>>();

    let stops = demands
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
        .collect::<Vec<Stop>>();

    let vehicles = capacities
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
        .collect::<Vec<Vehicle>>();

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_name(String::from("test"))
        .set_locations(locations)
        .set_depots(vec![Depot::new(
            0,
            LocationIdx::new(0),
            TimeWindow::new(SignedDuration::ZERO, SignedDuration::from_hours(8)),
        )])
        .set_vehicles(vehicles)
        .set_stops(stops);

    builder.build()
}

pub struct TestRoute {
    pub vehicle_id: usize,
    pub stop_ids: Vec<usize>,
}

/// Links the routes through insert moves, in order.
pub fn create_test_working_solution(
    problem: Arc<VehicleRoutingProblem>,
    routes: Vec<TestRoute>,
) -> WorkingSolution {
    let mut solution = WorkingSolution::new(problem);

    for route in routes {
        let mut after = Standstill::Vehicle(v(route.vehicle_id));
        for stop_id in route.stop_ids {
            solution
                .apply(
                    &Move::Insert {
                        stop: s(stop_id),
                        after,
                    },
                    NoopNotifier,
                )
                .unwrap();
            after = Standstill::Stop(s(stop_id));
        }
    }

    solution
}

pub fn chain_demand(solution: &WorkingSolution, vehicle: VehicleIdx) -> Demand {
    solution
        .chains()
        .stops(vehicle)
        .map(|stop| solution.problem().demand(stop))
        .sum()
}

pub fn chain(solution: &WorkingSolution, vehicle: VehicleIdx) -> Vec<usize> {
    solution
        .chains()
        .stops(vehicle)
        .map(|stop| stop.get())
        .collect()
}

/// The (entity, field) of every opened bracket, in order.
pub fn opened_brackets(log: &NotificationLog) -> Vec<(Entity, Field)> {
    log.notifications()
        .iter()
        .filter(|notification| notification.phase == Phase::Before)
        .map(|notification| (notification.entity, notification.field))
        .collect()
}
