use jiff::SignedDuration;
use thiserror::Error;

use crate::problem::stop::Demand;

/// Loading stops at the first of these; no partial problem is returned.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected {expected}, found {found:?}")]
    UnexpectedLine {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("line {line}: expected {expected} tokens, found {found}")]
    MalformedRecord {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },
    #[error("the depot with id ({depot_id}) has a demand ({demand})")]
    DepotDemand { depot_id: u64, demand: Demand },
    #[error("the depot with id ({depot_id}) has a service duration ({duration:?})")]
    DepotServiceDuration {
        depot_id: u64,
        duration: SignedDuration,
    },
    #[error("the customer with id ({customer_id}) has a negative demand ({demand})")]
    NegativeDemand { customer_id: u64, demand: Demand },
    #[error("no depot record found")]
    MissingDepot,
    #[error("no vehicle declared")]
    MissingVehicles,
}
