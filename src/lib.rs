#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # meshguard
//!
//! meshguard is the circuit breaking engine of a client-embedded service mesh SDK.
//! It protects callers from cascading failures: every completed remote call is reported
//! to the engine, the engine keeps time-bucketed fault statistics per protected resource
//! (a service, a method of a service or a single instance), evaluates the trigger conditions
//! of the configured circuit breaking rules, and drives a state machine per resource.
//!
//! The routing layer consults the engine before each call and skips resources
//! whose circuit is open.
//!
//! Generally, there are several steps when using meshguard:
//! 1. Provide the circuit breaking rules of your destination services through a `RuleSource`,
//!    e.g. the `InMemoryRuleSource`.
//! 2. Build a `CircuitBreakerEngine` from the rule source and the configurations.
//! 3. Ask the engine whether a resource may be called, and report the outcome of the call.
//!
//! ## Initialization
//!
//! The `api` module provides following interfaces:
//!
//! - `init_default(rule_source)`: Load configurations from environment variables. For undefined configurations, use default values.
//! - `init_with_config_file(config_path, rule_source)`: Load configurations from a YAML file.
//! - `init_with_config(config_entity, rule_source)`: Use hand-crafted `ConfigEntity` to initialize the engine.
//!
//! Example:
//!
//! ```rust
//! use meshguard::{circuitbreaker::InMemoryRuleSource, init_default};
//! use std::sync::Arc;
//!
//! let rule_source = Arc::new(InMemoryRuleSource::new());
//! let engine = init_default(rule_source.clone()).unwrap();
//! rule_source.add_listener(engine.rule_change_listener());
//! ```
//!
//! ## Check and Report
//!
//! ```rust
//! use meshguard::base::{Outcome, Resource, RetStatus};
//!
//! let resource = Resource::method("default", "echo", "/echo");
//! let check = engine.acquire_permission(&resource);
//! if check.pass {
//!     // call the remote resource here, then report what happened
//!     engine.report(&Outcome::new(resource, 200, 12, RetStatus::Success));
//! } else {
//!     // the circuit is open, use `check.fallback_info` if configured
//! }
//! ```
//!
//! ## Load Circuit Breaking Rules
//!
//! Rules are loaded per destination service. Each load assigns a new revision,
//! and the engine discards all the cached circuit states of that service,
//! so that they will be rebuilt against the new rules on the next report.
//!
//! ```rust
//! rule_source.load_rules(
//!     ServiceKey::new("default", "echo"),
//!     vec![Arc::new(circuitbreaker::Rule {
//!         name: "echo-errors".into(),
//!         level: Level::Service,
//!         block_configs: vec![circuitbreaker::BlockConfig {
//!             trigger_conditions: vec![TriggerCondition::ConsecutiveError { error_count: 10 }],
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     })],
//! )?;
//! ```

/// Engine construction with the different configuration sources.
pub mod api;
/// Core implementations, including the resource model, the sliding window statistics,
/// the configurations and the circuit breaking engine itself.
pub mod core;
/// Adapters for different logging crates.
pub mod logging;
// Utility functions.
pub mod utils;

// re-export precludes
pub use crate::core::*;
pub use api::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
