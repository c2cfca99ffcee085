pub mod chain_set;
pub mod error;
