use std::sync::Arc;

use fxhash::FxHashSet;
use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use shadow_load::{
    problem::{standstill::Standstill, stop::StopIdx},
    solver::{
        chain::chain_set::ChainSet,
        moves::Move,
        notifier::{BracketChecker, Entity, NoopNotifier, NotificationLog},
        propagator::ChainDemandPropagator,
        working_solution::WorkingSolution,
    },
};

use crate::test_utils::{chain_demand, create_test_problem};

mod test_utils;

/// Stops up to and including `standstill` in its chain.
fn prefix(chains: &ChainSet, standstill: Standstill) -> FxHashSet<StopIdx> {
    let Standstill::Stop(last) = standstill else {
        return FxHashSet::default();
    };
    let Ok(vehicle) = chains.owner(last) else {
        return FxHashSet::default();
    };

    let mut stops = FxHashSet::default();
    for stop in chains.stops(vehicle) {
        stops.insert(stop);
        if stop == last {
            break;
        }
    }

    stops
}

/// Stops sitting strictly before every point the move mutates.
fn untouched_stops(chains: &ChainSet, m: &Move) -> FxHashSet<StopIdx> {
    match *m {
        Move::Insert { after, .. } => prefix(chains, after),
        Move::Unassign { stop } => chains
            .previous(stop)
            .map(|previous| prefix(chains, previous))
            .unwrap_or_default(),
        Move::Relocate { stop, after } => {
            let Some(previous) = chains.previous(stop) else {
                return FxHashSet::default();
            };
            let before_old = prefix(chains, previous);
            let before_new = prefix(chains, after);

            if chains.owner_of(previous).ok() == chains.owner_of(after).ok() {
                before_old.intersection(&before_new).copied().collect()
            } else {
                before_old.union(&before_new).copied().collect()
            }
        }
        Move::SwapTails { a, b } => prefix(chains, a)
            .union(&prefix(chains, b))
            .copied()
            .collect(),
    }
}

fn instance() -> impl Strategy<Value = (Vec<i64>, Vec<i64>)> {
    (
        prop::collection::vec(1i64..30, 1..5),
        prop::collection::vec(1i64..20, 1..16),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_aggregates_stay_exact(
        (capacities, demands) in instance(),
        seed in any::<u64>(),
        moves in 1usize..200,
    ) {
        let problem = Arc::new(create_test_problem(&capacities, &demands));
        let mut solution = WorkingSolution::new(problem);
        let mut rng = SmallRng::seed_from_u64(seed);

        for _ in 0..moves {
            let Some(m) = Move::random(solution.problem(), solution.chains(), &mut rng) else {
                break;
            };
            solution.apply(&m, NoopNotifier).unwrap();

            for vehicle in solution.problem().vehicle_ids() {
                prop_assert_eq!(
                    solution.current_demand(vehicle),
                    chain_demand(&solution, vehicle)
                );
            }
        }

        prop_assert_eq!(solution.audit(), Ok(()));
    }

    #[test]
    fn prop_notifications_are_bracketed(
        (capacities, demands) in instance(),
        seed in any::<u64>(),
        moves in 1usize..200,
    ) {
        let problem = Arc::new(create_test_problem(&capacities, &demands));
        let mut solution = WorkingSolution::new(problem);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut checker = BracketChecker::new(NoopNotifier);

        for _ in 0..moves {
            let Some(m) = Move::random(solution.problem(), solution.chains(), &mut rng) else {
                break;
            };
            solution.apply(&m, &mut checker).unwrap();

            prop_assert!(checker.is_balanced(), "{:?}", checker.violations());
        }
    }

    #[test]
    fn prop_no_backward_leakage(
        (capacities, demands) in instance(),
        seed in any::<u64>(),
        moves in 1usize..200,
    ) {
        let problem = Arc::new(create_test_problem(&capacities, &demands));
        let mut solution = WorkingSolution::new(problem);
        let mut rng = SmallRng::seed_from_u64(seed);

        for _ in 0..moves {
            let Some(m) = Move::random(solution.problem(), solution.chains(), &mut rng) else {
                break;
            };
            let untouched = untouched_stops(solution.chains(), &m);

            let mut log = NotificationLog::default();
            solution.apply(&m, &mut log).unwrap();

            for stop in untouched {
                prop_assert!(!log.touches(Entity::Stop(stop)), "{} visited by {}", stop, m);
            }
        }
    }

    #[test]
    fn prop_rewalk_is_idempotent_and_bounded(
        (capacities, demands) in instance(),
        seed in any::<u64>(),
        moves in 1usize..100,
    ) {
        let problem = Arc::new(create_test_problem(&capacities, &demands));
        let mut solution = WorkingSolution::new(Arc::clone(&problem));
        let mut rng = SmallRng::seed_from_u64(seed);

        for _ in 0..moves {
            let Some(m) = Move::random(solution.problem(), solution.chains(), &mut rng) else {
                break;
            };
            solution.apply(&m, NoopNotifier).unwrap();

            let stop = StopIdx::new(rng.random_range(0..demands.len()));
            let remaining = match solution.chains().owner(stop) {
                Ok(vehicle) => solution
                    .chains()
                    .stops(vehicle)
                    .skip_while(|&other| other != stop)
                    .count(),
                Err(_) => 1,
            };

            let mut store = solution.store().clone();
            let stats = ChainDemandPropagator::new(
                &problem,
                solution.chains(),
                &mut store,
                NoopNotifier,
            )
            .on_stop_variable_changed(stop)
            .unwrap();

            prop_assert_eq!(&store, solution.store());
            prop_assert_eq!(stats.transfers, 0);
            prop_assert_eq!(stats.steps, remaining);
            prop_assert!(stats.steps <= demands.len());
        }
    }
}
