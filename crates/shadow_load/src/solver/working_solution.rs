use std::sync::Arc;

use fxhash::FxHashSet;
use serde::Serialize;
use thiserror::Error;

use crate::problem::{
    standstill::Standstill,
    stop::{Demand, StopIdx},
    vehicle::VehicleIdx,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{
    chain::chain_set::ChainSet,
    demand::demand_store::DemandStore,
    moves::{Move, MoveError},
    notifier::{ChangeNotifier, Entity, Field},
    propagator::PassStats,
};

/// A mismatch between the incrementally maintained state and the chains,
/// found by a from-scratch audit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("{vehicle} holds a current demand of {stored} but its chain sums to {expected}")]
    DemandMismatch {
        vehicle: VehicleIdx,
        stored: Demand,
        expected: Demand,
    },
    #[error("{stop} is counted by {attributed:?} but belongs to {actual:?}")]
    AttributionMismatch {
        stop: StopIdx,
        attributed: Option<VehicleIdx>,
        actual: Option<VehicleIdx>,
    },
    #[error("{stop} appears more than once in the chains")]
    DuplicateStop { stop: StopIdx },
    #[error("{stop} is linked but not reachable from any vehicle")]
    UnreachableStop { stop: StopIdx },
    #[error("{stop} follows {expected} but links back to {found:?}")]
    BrokenLink {
        stop: StopIdx,
        expected: Standstill,
        found: Option<Standstill>,
    },
    #[error("the chain of {vehicle} does not terminate")]
    UnterminatedChain { vehicle: VehicleIdx },
}

/// The chains and the derived demand aggregates of one solution.
///
/// Cloning yields a fully independent copy, which is how parallel workers
/// get their own state.
#[derive(Clone)]
pub struct WorkingSolution {
    problem: Arc<VehicleRoutingProblem>,
    chains: ChainSet,
    store: DemandStore,
}

impl WorkingSolution {
    /// Every stop unassigned and every aggregate at zero.
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        let num_stops = problem.stops().len();
        let num_vehicles = problem.vehicles().len();

        WorkingSolution {
            problem,
            chains: ChainSet::new(num_stops, num_vehicles),
            store: DemandStore::new(num_stops, num_vehicles),
        }
    }

    pub fn problem(&self) -> &VehicleRoutingProblem {
        self.problem.as_ref()
    }

    pub fn chains(&self) -> &ChainSet {
        &self.chains
    }

    pub fn store(&self) -> &DemandStore {
        &self.store
    }

    pub fn current_demand(&self, vehicle: VehicleIdx) -> Demand {
        self.store.get(vehicle)
    }

    pub fn apply<N: ChangeNotifier>(
        &mut self,
        m: &Move,
        notifier: N,
    ) -> Result<PassStats, MoveError> {
        m.apply(&self.problem, &mut self.chains, &mut self.store, notifier)
    }

    /// Cold start: recomputes every aggregate and attribution from the chains,
    /// bracketing each vehicle's `current_demand` once.
    pub fn recompute_all<N: ChangeNotifier>(&mut self, mut notifier: N) -> Result<(), AuditError> {
        self.store.reset();

        for vehicle in self.problem.vehicle_ids() {
            let mut total = 0;
            for stop in self.walk_chain(vehicle)? {
                self.store.attribute(stop, Some(vehicle));
                total += self.problem.demand(stop);
            }

            notifier.before(Entity::Vehicle(vehicle), Field::CurrentDemand);
            self.store.set(vehicle, total);
            notifier.after(Entity::Vehicle(vehicle), Field::CurrentDemand);
        }

        Ok(())
    }

    /// Verifies from scratch that every aggregate equals the demand of its
    /// chain, that chains are finite and consistently linked, and that every
    /// stop is either reachable exactly once or unassigned.
    pub fn audit(&self) -> Result<(), AuditError> {
        let mut seen = FxHashSet::default();

        for vehicle in self.problem.vehicle_ids() {
            let mut expected = 0;
            for stop in self.walk_chain(vehicle)? {
                if !seen.insert(stop) {
                    return Err(AuditError::DuplicateStop { stop });
                }

                let attributed = self.store.attribution(stop);
                if attributed != Some(vehicle) {
                    return Err(AuditError::AttributionMismatch {
                        stop,
                        attributed,
                        actual: Some(vehicle),
                    });
                }

                expected += self.problem.demand(stop);
            }

            let stored = self.store.get(vehicle);
            if stored != expected {
                return Err(AuditError::DemandMismatch {
                    vehicle,
                    stored,
                    expected,
                });
            }
        }

        for stop in self.problem.stop_ids() {
            if seen.contains(&stop) {
                continue;
            }
            if self.chains.is_assigned(stop) {
                return Err(AuditError::UnreachableStop { stop });
            }
            if let Some(attributed) = self.store.attribution(stop) {
                return Err(AuditError::AttributionMismatch {
                    stop,
                    attributed: Some(attributed),
                    actual: None,
                });
            }
        }

        Ok(())
    }

    /// The chain of `vehicle`, checked for termination and back-links.
    fn walk_chain(&self, vehicle: VehicleIdx) -> Result<Vec<StopIdx>, AuditError> {
        let mut stops = Vec::new();
        let mut previous = Standstill::Vehicle(vehicle);
        let mut current = self.chains.first_stop(vehicle);

        while let Some(stop) = current {
            if stops.len() == self.chains.num_stops() {
                return Err(AuditError::UnterminatedChain { vehicle });
            }

            let found = self.chains.previous(stop);
            if found != Some(previous) {
                return Err(AuditError::BrokenLink {
                    stop,
                    expected: previous,
                    found,
                });
            }

            stops.push(stop);
            previous = Standstill::Stop(stop);
            current = self.chains.next(stop);
        }

        Ok(stops)
    }

    pub fn unassigned_stops(&self) -> impl Iterator<Item = StopIdx> + '_ {
        self.problem
            .stop_ids()
            .filter(|&stop| !self.chains.is_assigned(stop))
    }

    pub fn overloaded_vehicles(&self) -> impl Iterator<Item = VehicleIdx> + '_ {
        self.problem.vehicle_ids().filter(|&vehicle| {
            self.problem
                .vehicle(vehicle)
                .overload(self.store.get(vehicle))
                > 0
        })
    }

    /// Sum of demand above capacity over all vehicles.
    pub fn total_overload(&self) -> Demand {
        self.problem
            .vehicle_ids()
            .map(|vehicle| {
                self.problem
                    .vehicle(vehicle)
                    .overload(self.store.get(vehicle))
            })
            .sum()
    }

    pub fn summary(&self) -> SolutionSummary {
        let routes = self
            .problem
            .vehicle_ids()
            .map(|vehicle_id| {
                let vehicle = self.problem.vehicle(vehicle_id);
                let current_demand = self.store.get(vehicle_id);
                RouteSummary {
                    vehicle: vehicle.external_id(),
                    capacity: vehicle.capacity(),
                    current_demand,
                    overload: vehicle.overload(current_demand),
                    stops: self
                        .chains
                        .stops(vehicle_id)
                        .map(|stop| self.problem.stop(stop).external_id())
                        .collect(),
                }
            })
            .collect();

        SolutionSummary {
            name: self.problem.name().to_owned(),
            routes,
            unassigned: self
                .unassigned_stops()
                .map(|stop| self.problem.stop(stop).external_id())
                .collect(),
            total_demand: self.store.total(),
            total_overload: self.total_overload(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub vehicle: u64,
    pub capacity: Demand,
    pub current_demand: Demand,
    /// Demand above capacity, zero when the load fits.
    pub overload: Demand,
    pub stops: Vec<u64>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SolutionSummary {
    pub name: String,
    pub routes: Vec<RouteSummary>,
    pub unassigned: Vec<u64>,
    pub total_demand: Demand,
    pub total_overload: Demand,
}
