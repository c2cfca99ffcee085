pub mod chain;
pub mod demand;
pub mod moves;
pub mod notifier;
pub mod propagator;
pub mod simulation;
pub mod working_solution;
