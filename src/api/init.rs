//! Initialization func builds the circuit breaking engine, including:
//! 1. resolve the config, from manually config or yaml file or env variable
//! 2. initialize the logger
//! 3. start the scheduler of the engine

use super::{config, config::ConfigEntity};
use crate::circuitbreaker::{CircuitBreakerEngine, EngineBuilder, LoggingStateChangeListener, RuleSource};
use crate::{logging, Result};
use std::sync::Arc;

/// `init_default` builds the engine using the configuration from system
/// environment and the default value.
#[inline]
pub fn init_default(rule_source: Arc<dyn RuleSource>) -> Result<CircuitBreakerEngine> {
    init_with_config_file("", rule_source)
}

/// `init_with_config` builds the engine using given config.
#[inline]
pub fn init_with_config(
    config_entity: ConfigEntity,
    rule_source: Arc<dyn RuleSource>,
) -> Result<CircuitBreakerEngine> {
    config_entity.check()?;
    init_engine(config_entity, rule_source)
}

/// `init_with_config_file` loads the general configuration from the given YAML file
/// and builds the engine. The environment still overrides the file.
#[inline]
pub fn init_with_config_file(
    config_path: &str,
    rule_source: Arc<dyn RuleSource>,
) -> Result<CircuitBreakerEngine> {
    let config_entity = config::load_config(config_path)?;
    init_engine(config_entity, rule_source)
}

fn init_engine(
    config_entity: ConfigEntity,
    rule_source: Arc<dyn RuleSource>,
) -> Result<CircuitBreakerEngine> {
    logging::logger_init(Some(config_entity.config.log_config_file.clone()));
    logging::info!("[Init] Resolved config: {}", config_entity);
    EngineBuilder::new(rule_source)
        .with_config(config_entity.config)
        .with_listener(Arc::new(LoggingStateChangeListener))
        .build()
}
