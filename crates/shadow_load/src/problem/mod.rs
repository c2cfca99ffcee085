pub mod depot;
pub mod location;
pub mod standstill;
pub mod stop;
pub mod time_window;
pub mod vehicle;
pub mod vehicle_routing_problem;
