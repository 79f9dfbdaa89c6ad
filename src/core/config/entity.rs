use super::constant::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// CircuitBreakerConfig represents the configuration items of the circuit breaking engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    // enable turns the whole engine on or off, a disabled engine reports every resource as closed.
    pub enable: bool,
    // check_period_ms is the period of the background scheduler,
    // `AUTO_CHECK_PERIOD_MS` derives it from the bucket width of the tracked sliding windows.
    pub check_period_ms: u64,
    // counters_expire_interval_ms is how long a resource may stay without any report
    // before its circuit state is swept out of the cache.
    pub counters_expire_interval_ms: u64,
    // bucket_count is the number of buckets of every sliding window.
    pub bucket_count: u32,
    // max_half_open_requests bounds the concurrent probes in half-open state,
    // unless the rule overrides it in its recover condition.
    pub max_half_open_requests: u32,
    // regex_cache_capacity is the capacity of the compiled pattern cache.
    pub regex_cache_capacity: usize,
    // log_config_file is the configuration file of log4rs.
    pub log_config_file: String,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerConfig {
            enable: true,
            check_period_ms: AUTO_CHECK_PERIOD_MS,
            counters_expire_interval_ms: DEFAULT_COUNTERS_EXPIRE_INTERVAL_MS,
            bucket_count: DEFAULT_BUCKET_COUNT,
            max_half_open_requests: DEFAULT_MAX_HALF_OPEN_REQUESTS,
            regex_cache_capacity: DEFAULT_REGEX_CACHE_CAPACITY,
            log_config_file: String::new(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn check(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(Error::msg("illegal circuit breaker configuration: bucket_count == 0"));
        }
        if self.counters_expire_interval_ms == 0 {
            return Err(Error::msg(
                "illegal circuit breaker configuration: counters_expire_interval_ms == 0",
            ));
        }
        if self.max_half_open_requests == 0 {
            return Err(Error::msg(
                "illegal circuit breaker configuration: max_half_open_requests == 0",
            ));
        }
        if self.regex_cache_capacity == 0 {
            return Err(Error::msg(
                "illegal circuit breaker configuration: regex_cache_capacity == 0",
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConfigEntity {
    pub version: String,
    pub config: CircuitBreakerConfig,
}

impl Default for ConfigEntity {
    fn default() -> Self {
        ConfigEntity {
            version: CONFIG_VERSION.into(),
            config: CircuitBreakerConfig::default(),
        }
    }
}

impl ConfigEntity {
    pub fn new() -> Self {
        ConfigEntity::default()
    }

    pub fn check(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(Error::msg("empty version"));
        }
        self.config.check()
    }
}

impl fmt::Display for ConfigEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmtted = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", fmtted)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_valid() {
        let entity = ConfigEntity::new();
        assert!(entity.check().is_ok());
        assert!(entity.config.enable);
        assert_eq!(entity.config.check_period_ms, AUTO_CHECK_PERIOD_MS);
    }

    #[test]
    fn invalid_items() {
        let mut entity = ConfigEntity::new();
        entity.version = String::new();
        assert!(entity.check().is_err());

        let mut entity = ConfigEntity::new();
        entity.config.bucket_count = 0;
        assert!(entity.check().is_err());

        let mut entity = ConfigEntity::new();
        entity.config.max_half_open_requests = 0;
        assert!(entity.check().is_err());

        let mut entity = ConfigEntity::new();
        entity.config.counters_expire_interval_ms = 0;
        assert!(entity.check().is_err());
    }

    #[test]
    fn partial_yaml() {
        let entity: ConfigEntity = serde_yaml::from_str(
            "version: v1\nconfig:\n  bucket_count: 20\n  counters_expire_interval_ms: 5000\n",
        )
        .unwrap();
        assert_eq!(entity.config.bucket_count, 20);
        assert_eq!(entity.config.counters_expire_interval_ms, 5000);
        assert_eq!(
            entity.config.max_half_open_requests,
            DEFAULT_MAX_HALF_OPEN_REQUESTS
        );
        assert!(format!("{}", entity).contains("\"bucket_count\": 20"));
    }
}
