//! mod `api` provides the topmost fundamental APIs for users using meshguard.
//! The engine must be built before any outcome is reported. There are three ways to build it:
//!
//!  1. `init_default(rule_source)`, using the system environment and the default config.
//!  2. `init_with_config(config_entity, rule_source)`, using a customized `ConfigEntity`.
//!  3. `init_with_config_file(config_path, rule_source)`, using a YAML file.
//!
//! Here is the example code to use meshguard:
//!
//! ```
//! use meshguard::base::{Outcome, Resource, RetStatus};
//! use meshguard::circuitbreaker::InMemoryRuleSource;
//! use std::sync::Arc;
//!
//! let rule_source = Arc::new(InMemoryRuleSource::new());
//! let engine = meshguard::init_default(rule_source.clone()).unwrap();
//! rule_source.add_listener(engine.rule_change_listener());
//!
//! let mut handlers = Vec::new();
//! let engine = Arc::new(engine);
//! for _ in 0..10 {
//!     let engine = Arc::clone(&engine);
//!     handlers.push(std::thread::spawn(move || {
//!         for i in 0..100 {
//!             let resource = Resource::method("default", "echo", "/echo");
//!             if engine.acquire_permission(&resource).pass {
//!                 // Passed, call the resource here.
//!                 let delay_ms = rand::random::<u64>() % 10;
//!                 let status = if i % 10 == 0 { RetStatus::Fail } else { RetStatus::Success };
//!                 engine.report(&Outcome::new(resource, 200, delay_ms, status));
//!             } else {
//!                 // Blocked, answer with the fallback of the rule if any.
//!             }
//!         }
//!     }));
//! }
//! for h in handlers {
//!     h.join().expect("Couldn't join on the associated thread");
//! }
//! engine.destroy();
//! ```
//!

pub mod init;

pub use init::*;

pub use crate::core::config;
