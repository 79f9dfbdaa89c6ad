use super::{Resource, ServiceKey};
use crate::utils::curr_time_millis;
use serde::{Deserialize, Serialize};

/// `RetStatus` is the coarse result class of a remote call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetStatus {
    Success,
    Fail,
    Timeout,
    /// the call was rejected locally, e.g., by an open circuit,
    /// it never reached the resource and tells nothing about its health
    Reject,
}

impl Default for RetStatus {
    fn default() -> RetStatus {
        RetStatus::Success
    }
}

impl RetStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, RetStatus::Fail | RetStatus::Timeout)
    }
}

/// `Outcome` records a completed remote call on a resource.
/// It is immutable once built, and it is the only input of the circuit statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    resource: Resource,
    /// the calling service, matched against the source of the rules
    caller: Option<ServiceKey>,
    ret_code: i64,
    delay_ms: u64,
    ret_status: RetStatus,
    timestamp_ms: u64,
}

impl Outcome {
    pub fn new(resource: Resource, ret_code: i64, delay_ms: u64, ret_status: RetStatus) -> Self {
        Outcome {
            resource,
            caller: None,
            ret_code,
            delay_ms,
            ret_status,
            timestamp_ms: curr_time_millis(),
        }
    }

    pub fn with_caller(mut self, caller: ServiceKey) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn caller(&self) -> Option<&ServiceKey> {
        self.caller.as_ref()
    }

    pub fn ret_code(&self) -> i64 {
        self.ret_code
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn ret_status(&self) -> RetStatus {
        self.ret_status
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_outcome() {
        let outcome = Outcome::new(Resource::service("default", "echo"), 500, 20, RetStatus::Fail)
            .with_caller(ServiceKey::new("default", "caller"))
            .with_timestamp(42);
        assert_eq!(outcome.ret_code(), 500);
        assert_eq!(outcome.delay_ms(), 20);
        assert_eq!(outcome.timestamp_ms(), 42);
        assert_eq!(outcome.caller().unwrap().service, "caller");
        assert!(outcome.ret_status().is_failure());
        assert!(!RetStatus::Reject.is_failure());
    }
}
