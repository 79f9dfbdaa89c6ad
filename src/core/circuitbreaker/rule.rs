use crate::base::Level;
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// `MatchType` is how a `MatchString` compares its value with the input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    Exact,
    Regex,
    NotEquals,
    /// the value is a comma separated set
    In,
    /// the value is a comma separated set
    NotIn,
}

impl Default for MatchType {
    fn default() -> MatchType {
        MatchType::Exact
    }
}

/// `MatchString` is a pattern on a string, e.g., an API path or a return code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchString {
    pub match_type: MatchType,
    pub value: String,
}

impl MatchString {
    pub fn exact<S: Into<String>>(value: S) -> Self {
        MatchString {
            match_type: MatchType::Exact,
            value: value.into(),
        }
    }

    pub fn regex<S: Into<String>>(value: S) -> Self {
        MatchString {
            match_type: MatchType::Regex,
            value: value.into(),
        }
    }

    pub fn not_equals<S: Into<String>>(value: S) -> Self {
        MatchString {
            match_type: MatchType::NotEquals,
            value: value.into(),
        }
    }

    pub fn in_set<S: Into<String>>(value: S) -> Self {
        MatchString {
            match_type: MatchType::In,
            value: value.into(),
        }
    }

    pub fn not_in_set<S: Into<String>>(value: S) -> Self {
        MatchString {
            match_type: MatchType::NotIn,
            value: value.into(),
        }
    }
}

/// `SourceMatcher` matches the calling service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMatcher {
    pub namespace: String,
    pub service: String,
}

/// `DestinationMatcher` matches the called service, and the called method for method level rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationMatcher {
    pub namespace: String,
    pub service: String,
    pub method: Option<MatchString>,
}

/// `RuleMatcher` decides which resources a rule applies to.
/// Empty names and `*` are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleMatcher {
    pub source: SourceMatcher,
    pub destination: DestinationMatcher,
}

/// `ErrorCondition` classifies an outcome as an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorCondition {
    /// the return code, rendered as a string, matches the pattern
    RetCode { pattern: MatchString },
    /// the call took at least `max_delay_ms`
    Delay { max_delay_ms: u64 },
}

/// `TriggerCondition` decides when a circuit opens.
/// New trigger types extend this enum and the shared evaluator in `breaker::trigger`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// opens when `error_count` errors arrive in a row
    ConsecutiveError { error_count: u32 },
    /// opens when the error ratio in the last `interval_ms` reaches `error_rate` (0.0-1.0),
    /// provided that at least `minimum_request` calls were observed
    ErrorRate {
        error_rate: f64,
        interval_ms: u64,
        minimum_request: u32,
    },
    /// opens when the ratio of calls taking at least `max_rt_ms` in the last `interval_ms`
    /// reaches `slow_rate` (0.0-1.0), provided that at least `minimum_request` calls were observed
    SlowRate {
        max_rt_ms: u64,
        slow_rate: f64,
        interval_ms: u64,
        minimum_request: u32,
    },
}

impl TriggerCondition {
    pub fn is_valid(&self) -> Result<()> {
        match *self {
            TriggerCondition::ConsecutiveError { error_count } => {
                if error_count == 0 {
                    return Err(Error::msg("invalid error_count of consecutive error trigger"));
                }
            }
            TriggerCondition::ErrorRate {
                error_rate,
                interval_ms,
                ..
            } => {
                check_ratio(error_rate, "error_rate")?;
                if interval_ms == 0 {
                    return Err(Error::msg("invalid interval_ms of error rate trigger"));
                }
            }
            TriggerCondition::SlowRate {
                slow_rate,
                interval_ms,
                ..
            } => {
                check_ratio(slow_rate, "slow_rate")?;
                if interval_ms == 0 {
                    return Err(Error::msg("invalid interval_ms of slow rate trigger"));
                }
            }
        }
        Ok(())
    }
}

fn check_ratio(ratio: f64, name: &str) -> Result<()> {
    if ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
        return Err(Error::msg(format!(
            "invalid {} {} (valid range: (0.0, 1.0])",
            name, ratio
        )));
    }
    Ok(())
}

/// `BlockConfig` groups the error conditions and the trigger conditions
/// applied to an (optional) API scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub name: String,
    /// only method resources whose path matches are guarded by this config
    pub api: Option<MatchString>,
    /// without any error condition, failed and timed-out calls are errors
    pub error_conditions: Vec<ErrorCondition>,
    pub trigger_conditions: Vec<TriggerCondition>,
}

/// `RecoverCondition` drives the half-open probing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoverCondition {
    /// how long the circuit stays open before probing starts
    pub sleep_window_ms: u64,
    /// the consecutive successful probes required to close the circuit
    pub consecutive_success: u32,
    /// overrides `CircuitBreakerConfig::max_half_open_requests`
    pub max_half_open_requests: Option<u32>,
}

impl Default for RecoverCondition {
    fn default() -> Self {
        RecoverCondition {
            sleep_window_ms: 60 * 1000,
            consecutive_success: 3,
            max_half_open_requests: None,
        }
    }
}

/// `FallbackResponse` is what the caller may answer with, instead of calling an open resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackResponse {
    pub code: i32,
    pub headers: HashMap<String, String>,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub enable: bool,
    pub response: FallbackResponse,
}

/// Rule encompasses the fields of circuit breaking rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// unique id
    pub id: String,
    pub name: String,
    /// a disabled rule never applies
    pub enable: bool,
    pub level: Level,
    pub rule_matcher: RuleMatcher,
    pub block_configs: Vec<BlockConfig>,
    pub recover_condition: RecoverCondition,
    pub fallback_config: Option<FallbackConfig>,
    /// revision of the rule set this rule was delivered with
    pub revision: String,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            enable: true,
            level: Level::default(),
            rule_matcher: RuleMatcher::default(),
            block_configs: Vec::new(),
            recover_condition: RecoverCondition::default(),
            fallback_config: None,
            revision: String::new(),
        }
    }
}

impl Rule {
    pub fn is_valid(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::msg("empty rule name"));
        }
        if self.block_configs.is_empty() {
            return Err(Error::msg("no block config"));
        }
        for block_config in &self.block_configs {
            if block_config.trigger_conditions.is_empty() {
                return Err(Error::msg(format!(
                    "no trigger condition in block config {:?}",
                    block_config.name
                )));
            }
            for trigger in &block_config.trigger_conditions {
                trigger.is_valid()?;
            }
            if let Some(api) = &block_config.api {
                check_pattern(api)?;
            }
            for cond in &block_config.error_conditions {
                if let ErrorCondition::RetCode { pattern } = cond {
                    check_pattern(pattern)?;
                }
            }
        }
        if self.recover_condition.sleep_window_ms == 0 {
            return Err(Error::msg("invalid sleep_window_ms"));
        }
        if self.recover_condition.consecutive_success == 0 {
            return Err(Error::msg("invalid consecutive_success"));
        }
        if self.recover_condition.max_half_open_requests == Some(0) {
            return Err(Error::msg("invalid max_half_open_requests"));
        }
        if let Some(method) = &self.rule_matcher.destination.method {
            check_pattern(method)?;
        }
        Ok(())
    }

    /// `fallback` returns the fallback response if it is enabled
    pub fn fallback(&self) -> Option<&FallbackResponse> {
        self.fallback_config
            .as_ref()
            .filter(|c| c.enable)
            .map(|c| &c.response)
    }
}

fn check_pattern(pattern: &MatchString) -> Result<()> {
    if pattern.match_type == MatchType::Regex {
        Regex::new(&pattern.value)?;
    }
    Ok(())
}

/// The revision and the id are bookkeeping,
/// two rules are equal when they protect the same resources in the same way.
impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.enable == other.enable
            && self.level == other.level
            && self.rule_matcher == other.rule_matcher
            && self.block_configs == other.block_configs
            && self.recover_condition == other.recover_condition
            && self.fallback_config == other.fallback_config
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmtted = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", fmtted)
    }
}
