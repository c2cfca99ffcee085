pub mod demand_store;
