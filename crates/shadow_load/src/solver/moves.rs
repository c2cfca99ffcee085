use std::fmt;

use rand::{Rng, seq::IteratorRandom};
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::problem::{
    standstill::Standstill, stop::StopIdx, vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{
    chain::{chain_set::ChainSet, error::ChainError},
    demand::demand_store::DemandStore,
    notifier::ChangeNotifier,
    propagator::{ChainDemandPropagator, PassStats, PropagationError},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The move does not fit the current chains; nothing was changed.
    #[error("illegal move: {0}")]
    Illegal(#[source] ChainError),
    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Insert,
    Unassign,
    Relocate,
    SwapTails,
}

impl MoveKind {
    pub const ALL: [MoveKind; 4] = [
        MoveKind::Insert,
        MoveKind::Unassign,
        MoveKind::Relocate,
        MoveKind::SwapTails,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MoveKind::Insert => "insert",
            MoveKind::Unassign => "unassign",
            MoveKind::Relocate => "relocate",
            MoveKind::SwapTails => "swap_tails",
        }
    }
}

/// A structural change to the chains, applied then propagated.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Link an unassigned stop after `after`.
    Insert { stop: StopIdx, after: Standstill },
    /// Unlink an assigned stop.
    Unassign { stop: StopIdx },
    /// Move an assigned stop after `after`, in the same or another chain.
    Relocate { stop: StopIdx, after: Standstill },
    /// Exchange the tails following `a` and `b`, which sit in different chains.
    SwapTails { a: Standstill, b: Standstill },
}

/// Which propagator entry point a changed stop is reported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Inserted(StopIdx),
    VariableChanged(StopIdx),
    Removed(StopIdx),
}

pub type Changes = SmallVec<[Change; 4]>;

impl Move {
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::Insert { .. } => MoveKind::Insert,
            Move::Unassign { .. } => MoveKind::Unassign,
            Move::Relocate { .. } => MoveKind::Relocate,
            Move::SwapTails { .. } => MoveKind::SwapTails,
        }
    }

    /// Checks the move against the current chains without touching them.
    pub fn validate(&self, chains: &ChainSet) -> Result<(), ChainError> {
        match *self {
            Move::Insert { stop, after } => {
                if let Some(previous) = chains.previous(stop) {
                    return Err(ChainError::StopAlreadyAssigned { stop, previous });
                }
                validate_anchor(chains, stop, after)
            }
            Move::Unassign { stop } => {
                if !chains.is_assigned(stop) {
                    return Err(ChainError::StopNotInChain(stop));
                }
                Ok(())
            }
            Move::Relocate { stop, after } => {
                if !chains.is_assigned(stop) {
                    return Err(ChainError::StopNotInChain(stop));
                }
                validate_anchor(chains, stop, after)
            }
            Move::SwapTails { a, b } => {
                let owner_a = chains.owner_of(a)?;
                let owner_b = chains.owner_of(b)?;
                if owner_a == owner_b {
                    return Err(ChainError::SameVehicle(owner_a));
                }
                Ok(())
            }
        }
    }

    /// Mutates the chains and lists, in reporting order, the stops whose
    /// predecessor changed. Successors already covered by an earlier walk of
    /// the same chain are left out.
    pub fn apply_structure(&self, chains: &mut ChainSet) -> Result<Changes, ChainError> {
        self.validate(chains)?;

        let mut changes = Changes::new();
        match *self {
            Move::Insert { stop, after } => {
                chains.insert_after(stop, after)?;
                changes.push(Change::Inserted(stop));
            }
            Move::Unassign { stop } => {
                let successor = chains.detach(stop)?;
                changes.push(Change::VariableChanged(stop));
                changes.extend(successor.map(Change::VariableChanged));
                changes.push(Change::Removed(stop));
            }
            Move::Relocate { stop, after } => {
                let successor = chains.detach(stop)?;
                chains.insert_after(stop, after)?;
                // A successor that now directly follows `stop` is walked anyway
                let covered = chains.next(stop);
                changes.push(Change::VariableChanged(stop));
                changes.extend(
                    successor
                        .filter(|&successor| Some(successor) != covered)
                        .map(Change::VariableChanged),
                );
            }
            Move::SwapTails { a, b } => {
                let (head_a, head_b) = chains.swap_tails(a, b)?;
                changes.extend(head_a.map(Change::VariableChanged));
                changes.extend(head_b.map(Change::VariableChanged));
            }
        }

        Ok(changes)
    }

    /// Applies the move and brings every aggregate it touched up to date.
    pub fn apply<N: ChangeNotifier>(
        &self,
        problem: &VehicleRoutingProblem,
        chains: &mut ChainSet,
        store: &mut DemandStore,
        notifier: N,
    ) -> Result<PassStats, MoveError> {
        let changes = self.apply_structure(chains).map_err(MoveError::Illegal)?;

        let mut propagator = ChainDemandPropagator::new(problem, chains, store, notifier);
        let mut stats = PassStats::default();
        for change in changes {
            let pass = match change {
                Change::Inserted(stop) => propagator.on_stop_inserted(stop)?,
                Change::VariableChanged(stop) => propagator.on_stop_variable_changed(stop)?,
                Change::Removed(stop) => propagator.on_stop_removed(stop)?,
            };
            stats.merge(pass);
        }

        Ok(stats)
    }

    /// Draws a legal move uniformly among the applicable kinds. Returns `None`
    /// when the instance has nothing to move.
    pub fn random<R: Rng>(
        problem: &VehicleRoutingProblem,
        chains: &ChainSet,
        rng: &mut R,
    ) -> Option<Move> {
        let has_unassigned = problem.stop_ids().any(|stop| !chains.is_assigned(stop));
        let has_assigned = problem.stop_ids().any(|stop| chains.is_assigned(stop));

        let kinds = MoveKind::ALL.into_iter().filter(|kind| match kind {
            MoveKind::Insert => has_unassigned,
            MoveKind::Unassign | MoveKind::Relocate => has_assigned,
            MoveKind::SwapTails => has_assigned && problem.vehicles().len() > 1,
        });

        match kinds.choose(rng)? {
            MoveKind::Insert => {
                let stop = problem
                    .stop_ids()
                    .filter(|&stop| !chains.is_assigned(stop))
                    .choose(rng)?;
                let after = random_standstill(problem, chains, rng, None)?;
                Some(Move::Insert { stop, after })
            }
            MoveKind::Unassign => {
                let stop = random_assigned_stop(problem, chains, rng)?;
                Some(Move::Unassign { stop })
            }
            MoveKind::Relocate => {
                let stop = random_assigned_stop(problem, chains, rng)?;
                let after = random_standstill(problem, chains, rng, Some(stop))?;
                Some(Move::Relocate { stop, after })
            }
            MoveKind::SwapTails => {
                let a = random_standstill(problem, chains, rng, None)?;
                let owner_a = chains.owner_of(a).ok()?;
                let vehicle_b = problem
                    .vehicle_ids()
                    .filter(|&vehicle| vehicle != owner_a)
                    .choose(rng)?;
                let b = std::iter::once(Standstill::Vehicle(vehicle_b))
                    .chain(chains.stops(vehicle_b).map(Standstill::Stop))
                    .choose(rng)?;
                Some(Move::SwapTails { a, b })
            }
        }
    }
}

fn validate_anchor(chains: &ChainSet, stop: StopIdx, after: Standstill) -> Result<(), ChainError> {
    match after {
        Standstill::Stop(anchor) if anchor == stop => Err(ChainError::SelfLink(stop)),
        Standstill::Stop(anchor) if !chains.is_assigned(anchor) => {
            Err(ChainError::StopNotInChain(anchor))
        }
        _ => Ok(()),
    }
}

fn random_assigned_stop<R: Rng>(
    problem: &VehicleRoutingProblem,
    chains: &ChainSet,
    rng: &mut R,
) -> Option<StopIdx> {
    problem
        .stop_ids()
        .filter(|&stop| chains.is_assigned(stop))
        .choose(rng)
}

/// A vehicle anchor or an assigned stop, never `excluded`.
fn random_standstill<R: Rng>(
    problem: &VehicleRoutingProblem,
    chains: &ChainSet,
    rng: &mut R,
    excluded: Option<StopIdx>,
) -> Option<Standstill> {
    let vehicle = problem.random_vehicle(rng)?;

    std::iter::once(Standstill::Vehicle(vehicle))
        .chain(
            chains
                .stops(vehicle)
                .filter(|&stop| Some(stop) != excluded)
                .map(Standstill::Stop),
        )
        .choose(rng)
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Insert { stop, after } => write!(f, "insert {stop} after {after}"),
            Move::Unassign { stop } => write!(f, "unassign {stop}"),
            Move::Relocate { stop, after } => write!(f, "relocate {stop} after {after}"),
            Move::SwapTails { a, b } => write!(f, "swap tails after {a} and {b}"),
        }
    }
}
