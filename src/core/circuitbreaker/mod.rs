//! `circuitbreaker` mod provides the circuit breaking of the service, method and instance resources.

pub mod breaker;
pub mod cache;
pub mod engine;
pub mod matcher;
pub mod resolver;
pub mod rule;
pub mod rule_manager;
pub mod scheduler;
pub mod status;

pub use breaker::*;
pub use cache::*;
pub use engine::*;
pub use matcher::*;
pub use resolver::*;
pub use rule::*;
pub use rule_manager::*;
pub use scheduler::*;
pub use status::*;
