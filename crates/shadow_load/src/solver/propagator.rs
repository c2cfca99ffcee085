use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{Level, instrument, trace};

use crate::problem::{
    standstill::Standstill,
    stop::{Demand, StopIdx},
    vehicle::VehicleIdx,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{
    chain::{chain_set::ChainSet, error::ChainError},
    demand::demand_store::DemandStore,
    notifier::{ChangeNotifier, Entity, Field},
};

/// A structural invariant broke during a propagation pass. The pass is
/// aborted and the data must be considered corrupted: this always points at
/// the layer that mutated the chains.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropagationError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("{stop} has a non-positive demand ({demand})")]
    NonPositiveDemand { stop: StopIdx, demand: Demand },
    #[error("{stop} follows {expected} but links back to {found:?}")]
    BrokenLink {
        stop: StopIdx,
        expected: StopIdx,
        found: Option<Standstill>,
    },
    #[error("current demand of {vehicle} would become negative ({value})")]
    NegativeDemand { vehicle: VehicleIdx, value: Demand },
}

/// What a single propagation pass did.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    /// Stops visited by the forward walk.
    pub steps: usize,
    /// Segments of stops whose demand moved between two aggregates.
    pub transfers: usize,
    /// Total demand that changed vehicle.
    pub moved_demand: Demand,
}

impl PassStats {
    pub fn merge(&mut self, other: PassStats) {
        self.steps += other.steps;
        self.transfers += other.transfers;
        self.moved_demand += other.moved_demand;
    }
}

/// Consecutive walked stops whose demand leaves `from` for `to`.
#[derive(Debug, Clone, Copy)]
struct Transfer {
    from: Option<VehicleIdx>,
    to: Option<VehicleIdx>,
    running_total: Demand,
}

/// Keeps every vehicle's `current_demand` equal to the demand of its chain
/// after each structural mutation, by walking forward from the mutated stop.
///
/// The chains must already reflect the mutation when an entry point is
/// called. Only stops from the mutated one to the end of its chain are
/// visited; their contribution is moved between aggregates using the
/// per-stop attribution recorded in the store.
pub struct ChainDemandPropagator<'a, N> {
    problem: &'a VehicleRoutingProblem,
    chains: &'a ChainSet,
    store: &'a mut DemandStore,
    notifier: N,
}

impl<'a, N: ChangeNotifier> ChainDemandPropagator<'a, N> {
    pub fn new(
        problem: &'a VehicleRoutingProblem,
        chains: &'a ChainSet,
        store: &'a mut DemandStore,
        notifier: N,
    ) -> Self {
        ChainDemandPropagator {
            problem,
            chains,
            store,
            notifier,
        }
    }

    pub fn into_notifier(self) -> N {
        self.notifier
    }

    /// `stop` was just linked into a chain.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn on_stop_inserted(&mut self, stop: StopIdx) -> Result<PassStats, PropagationError> {
        let current_vehicle = self.chains.owner(stop)?;
        self.propagate(stop, Some(current_vehicle))
    }

    /// `stop` was unlinked. The remaining chain is re-linked by the caller,
    /// which reports that as a change on the successor, so there is nothing
    /// to do here.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn on_stop_removed(&mut self, stop: StopIdx) -> Result<PassStats, PropagationError> {
        Ok(PassStats::default())
    }

    /// The predecessor of `stop` changed, possibly to another vehicle's chain
    /// or to nothing at all (the stop became unassigned).
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn on_stop_variable_changed(
        &mut self,
        stop: StopIdx,
    ) -> Result<PassStats, PropagationError> {
        let current_vehicle = if self.chains.is_assigned(stop) {
            Some(self.chains.owner(stop)?)
        } else {
            None
        };

        self.propagate(stop, current_vehicle)
    }

    fn propagate(
        &mut self,
        start: StopIdx,
        current_vehicle: Option<VehicleIdx>,
    ) -> Result<PassStats, PropagationError> {
        self.check_walk(start, current_vehicle)?;

        let mut stats = PassStats::default();
        let mut segment: Option<Transfer> = None;

        for step in Walk::new(self.problem, self.chains, start) {
            let (stop, demand) = step?;
            let attributed = self.store.attribution(stop);

            // The segment ending here is settled before this stop is bracketed
            if let Some(closed) = extend_segment(&mut segment, attributed, current_vehicle, demand)
            {
                self.flush(closed, &mut stats);
            }

            self.notifier.before(Entity::Stop(stop), Field::Vehicle);
            self.store.attribute(stop, current_vehicle);
            self.notifier.after(Entity::Stop(stop), Field::Vehicle);
            stats.steps += 1;

            trace!(%stop, ?attributed, ?current_vehicle, demand, "walk step");
        }

        if let Some(closed) = segment.take() {
            self.flush(closed, &mut stats);
        }

        trace!(
            %start,
            steps = stats.steps,
            transfers = stats.transfers,
            moved_demand = stats.moved_demand,
            "propagation pass"
        );

        Ok(stats)
    }

    /// Runs the walk without writing anything: structural checks for every
    /// stop, then every transfer replayed on tentative aggregates. A failing
    /// pass therefore leaves the store and the notifier untouched.
    fn check_walk(
        &self,
        start: StopIdx,
        current_vehicle: Option<VehicleIdx>,
    ) -> Result<(), PropagationError> {
        let mut tentative = TentativeDemands::new();
        let mut segment: Option<Transfer> = None;

        for step in Walk::new(self.problem, self.chains, start) {
            let (stop, demand) = step?;
            let attributed = self.store.attribution(stop);

            if let Some(closed) = extend_segment(&mut segment, attributed, current_vehicle, demand)
            {
                self.check_transfer(closed, &mut tentative)?;
            }
        }

        if let Some(closed) = segment {
            self.check_transfer(closed, &mut tentative)?;
        }

        Ok(())
    }

    fn check_transfer(
        &self,
        transfer: Transfer,
        tentative: &mut TentativeDemands,
    ) -> Result<(), PropagationError> {
        if let Some(vehicle) = transfer.to {
            *tentative_demand(&*self.store, tentative, vehicle) += transfer.running_total;
        }

        if let Some(vehicle) = transfer.from {
            let value = tentative_demand(&*self.store, tentative, vehicle);
            *value -= transfer.running_total;
            if *value < 0 {
                return Err(PropagationError::NegativeDemand {
                    vehicle,
                    value: *value,
                });
            }
        }

        Ok(())
    }

    /// Adds the segment to the gaining vehicle, then takes it away from the
    /// losing one, each inside its own bracket.
    fn flush(&mut self, transfer: Transfer, stats: &mut PassStats) {
        if let Some(vehicle) = transfer.to {
            let value = self.store.get(vehicle) + transfer.running_total;
            self.write_current_demand(vehicle, value);
        }

        if let Some(vehicle) = transfer.from {
            let value = self.store.get(vehicle) - transfer.running_total;
            self.write_current_demand(vehicle, value);
        }

        stats.transfers += 1;
        stats.moved_demand += transfer.running_total;
    }

    fn write_current_demand(&mut self, vehicle: VehicleIdx, value: Demand) {
        self.notifier.before(Entity::Vehicle(vehicle), Field::CurrentDemand);
        self.store.set(vehicle, value);
        self.notifier.after(Entity::Vehicle(vehicle), Field::CurrentDemand);
    }
}

/// Adds a stop moving from `from` to `to` to the open segment. Returns the
/// segment that this stop closes, if any.
fn extend_segment(
    segment: &mut Option<Transfer>,
    from: Option<VehicleIdx>,
    to: Option<VehicleIdx>,
    demand: Demand,
) -> Option<Transfer> {
    match segment {
        Some(transfer) if transfer.from == from && transfer.to == to => {
            transfer.running_total += demand;
            None
        }
        _ => {
            let opened = (from != to).then_some(Transfer {
                from,
                to,
                running_total: demand,
            });
            std::mem::replace(segment, opened)
        }
    }
}

type TentativeDemands = SmallVec<[(VehicleIdx, Demand); 4]>;

fn tentative_demand<'t>(
    store: &DemandStore,
    tentative: &'t mut TentativeDemands,
    vehicle: VehicleIdx,
) -> &'t mut Demand {
    let index = match tentative.iter().position(|&(other, _)| other == vehicle) {
        Some(index) => index,
        None => {
            tentative.push((vehicle, store.get(vehicle)));
            tentative.len() - 1
        }
    };

    &mut tentative[index].1
}

/// Stops from `start` to the end of its chain. Each stop is checked for the
/// invariants the walk relies on before it is yielded with its demand; the
/// walk ends after the first failure.
struct Walk<'a> {
    problem: &'a VehicleRoutingProblem,
    chains: &'a ChainSet,
    start: StopIdx,
    previous: Option<StopIdx>,
    current: Option<StopIdx>,
    steps: usize,
}

impl<'a> Walk<'a> {
    fn new(problem: &'a VehicleRoutingProblem, chains: &'a ChainSet, start: StopIdx) -> Self {
        Walk {
            problem,
            chains,
            start,
            previous: None,
            current: Some(start),
            steps: 0,
        }
    }

    fn check(&self, stop: StopIdx) -> Result<Demand, PropagationError> {
        // Every stop after the first inherits the vehicle of the stop it was
        // reached from, provided the back-link agrees.
        if let Some(expected) = self.previous {
            let found = self.chains.previous(stop);
            if found != Some(Standstill::Stop(expected)) {
                return Err(PropagationError::BrokenLink {
                    stop,
                    expected,
                    found,
                });
            }
        }

        if self.steps == self.chains.num_stops() {
            return Err(ChainError::CycleDetected {
                stop: self.start,
                steps: self.steps,
            }
            .into());
        }

        let demand = self.problem.demand(stop);
        if demand <= 0 {
            return Err(PropagationError::NonPositiveDemand { stop, demand });
        }

        Ok(demand)
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<(StopIdx, Demand), PropagationError>;

    fn next(&mut self) -> Option<Self::Item> {
        let stop = self.current?;

        match self.check(stop) {
            Ok(demand) => {
                self.steps += 1;
                self.previous = Some(stop);
                self.current = self.chains.next(stop);
                Some(Ok((stop, demand)))
            }
            Err(error) => {
                self.current = None;
                Some(Err(error))
            }
        }
    }
}
