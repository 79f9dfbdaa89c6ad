pub mod base;
// sliding windows
pub mod stat;
// rules, circuit states, resource caches and the engine
pub mod circuitbreaker;
pub mod config;
