use super::FallbackResponse;
use crate::utils::format_time_millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// States of Circuit Breaker State Machine
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Close,
    Open,
    HalfOpen,
    /// terminal, the state has been evicted or the engine destroyed
    Destroyed,
}

impl Default for Status {
    fn default() -> Status {
        Status::Close
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Close => "Close",
            Status::Open => "Open",
            Status::HalfOpen => "HalfOpen",
            Status::Destroyed => "Destroyed",
        };
        f.write_str(name)
    }
}

/// `CircuitBreakerStatus` is a snapshot of the status of a resource circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerStatus {
    /// the rule the circuit was built from, empty if no rule applies
    pub rule_name: String,
    pub status: Status,
    /// why the circuit entered the status, e.g., the satisfied trigger
    pub reason: String,
    pub start_time_ms: u64,
    /// only present while the circuit is open and the rule enables a fallback
    pub fallback_info: Option<FallbackResponse>,
}

impl CircuitBreakerStatus {
    pub fn new<N: Into<String>, R: Into<String>>(
        rule_name: N,
        status: Status,
        reason: R,
        start_time_ms: u64,
    ) -> Self {
        CircuitBreakerStatus {
            rule_name: rule_name.into(),
            status,
            reason: reason.into(),
            start_time_ms,
            fallback_info: None,
        }
    }

    /// the status reported for resources without any tracked circuit
    pub fn close() -> Self {
        CircuitBreakerStatus::default()
    }

    pub fn with_fallback(mut self, fallback: Option<FallbackResponse>) -> Self {
        self.fallback_info = fallback;
        self
    }

    pub fn is_available(&self) -> bool {
        self.status != Status::Open
    }
}

impl fmt::Display for CircuitBreakerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(rule: {:?}, since: {}, reason: {:?})",
            self.status,
            self.rule_name,
            format_time_millis(self.start_time_ms),
            self.reason
        )
    }
}

/// `CheckResult` is the answer to a call permission request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckResult {
    pub pass: bool,
    pub rule_name: String,
    pub fallback_info: Option<FallbackResponse>,
}

impl CheckResult {
    pub fn pass() -> Self {
        CheckResult {
            pass: true,
            ..Default::default()
        }
    }

    pub fn blocked(rule_name: String, fallback_info: Option<FallbackResponse>) -> Self {
        CheckResult {
            pass: false,
            rule_name,
            fallback_info,
        }
    }
}
