use std::{hint::black_box, sync::Arc};

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use jiff::SignedDuration;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use shadow_load::{
    problem::{
        depot::Depot,
        location::{Location, LocationIdx},
        standstill::Standstill,
        stop::{StopBuilder, StopIdx},
        time_window::TimeWindow,
        vehicle::{VehicleBuilder, VehicleIdx},
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        moves::Move, notifier::NoopNotifier, simulation::initial_solution,
        working_solution::WorkingSolution,
    },
};

fn create_problem(num_vehicles: usize, num_stops: usize) -> VehicleRoutingProblem {
    let mut rng = SmallRng::seed_from_u64(42);

    let locations = (0..=num_stops)
        .map(|index| {
            Location::from_cartesian(
                index as u64,
                rng.random_range(0.0..100.0),
                rng.random_range(0.0..100.0),
            )
        })
        .collect::<Vec<_>>();

    let stops = (0..num_stops)
        .map(|index| {
            let mut builder = StopBuilder::default();
            builder
                .set_external_id(index as u64 + 1)
                .set_location_id(index + 1)
                .set_demand(rng.random_range(1..30));
            builder.build()
        })
        .collect();

    let vehicles = (0..num_vehicles)
        .map(|index| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_external_id(index as u64)
                .set_capacity(200)
                .set_depot_id(0);
            builder.build()
        })
        .collect();

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_name(String::from("bench"))
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

fn propagation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation");

    for (num_vehicles, num_stops) in [(5, 100), (25, 1000)] {
        let problem = Arc::new(create_problem(num_vehicles, num_stops));
        let solution = initial_solution(problem).unwrap();

        // Relocating the first stop of a chain walks the whole chain
        group.bench_function(format!("relocate head {num_stops}"), |b| {
            b.iter_batched(
                || solution.clone(),
                |mut solution: WorkingSolution| {
                    let stop = StopIdx::new(0);
                    let after = Standstill::Vehicle(VehicleIdx::new(1));
                    black_box(solution.apply(&Move::Relocate { stop, after }, NoopNotifier))
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("random moves {num_stops}"), |b| {
            let mut rng = SmallRng::seed_from_u64(7);
            let mut solution = solution.clone();
            b.iter(|| {
                if let Some(m) = Move::random(solution.problem(), solution.chains(), &mut rng) {
                    black_box(solution.apply(&m, NoopNotifier)).ok();
                }
            })
        });

        group.bench_function(format!("recompute all {num_stops}"), |b| {
            let mut solution = solution.clone();
            b.iter(|| black_box(solution.recompute_all(NoopNotifier)))
        });

        group.bench_function(format!("audit {num_stops}"), |b| {
            b.iter(|| black_box(solution.audit()))
        });
    }

    group.finish();
}

criterion_group!(benches, propagation_benchmark);
criterion_main!(benches);
