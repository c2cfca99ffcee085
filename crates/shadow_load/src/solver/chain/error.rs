use thiserror::Error;

use crate::problem::{standstill::Standstill, stop::StopIdx, vehicle::VehicleIdx};

/// Structural failures of the chain model. Every variant points at a bug in
/// the caller that mutated the chains, never at bad input data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("{0} is not linked into any chain")]
    StopNotInChain(StopIdx),
    #[error("{stop} is already linked after {previous}")]
    StopAlreadyAssigned { stop: StopIdx, previous: Standstill },
    #[error("{0} cannot be linked after itself")]
    SelfLink(StopIdx),
    #[error("cycle detected while walking from {stop} after {steps} steps")]
    CycleDetected { stop: StopIdx, steps: usize },
    #[error("both tails already belong to {0}")]
    SameVehicle(VehicleIdx),
}
