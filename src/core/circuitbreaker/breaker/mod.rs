//!  Circuit Breaker State Machine of a resource:
//!
//!                                switch to open based on rule
//!
//!             +-----------------------------------------------------------------------+
//!             |                                                                       |
//!             |                                                                       v
//!     +----------------+                   +----------------+  Sleep window   +----------------+
//!     |                |                   |                |<----------------|                |
//!     |                |   Probe succeed   |                |                 |                |
//!     |     Closed     |<------------------|    HalfOpen    |                 |      Open      |
//!     |                |                   |                |   Probe failed  |                |
//!     |                |                   |                +---------------->|                |
//!     +----------------+                   +----------------+                 +----------------+
//!
//!  Any of the states above moves to the terminal `Destroyed` state,
//!  once the state is evicted from the cache or the engine is destroyed.

#![allow(clippy::wrong_self_convention)]

/// Bounded admission of the recovery probes
pub mod half_open;
/// Trigger condition evaluation
pub mod trigger;

pub use half_open::*;
pub use trigger::*;

use super::{BlockConfig, CircuitBreakerStatus, RegexCache, Rule, Status};
use crate::base::{Outcome, Resource, RetStatus};
use crate::{logging, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// `StateChangeListener` listens on the state change events of the resource circuits.
/// It is called synchronously after the transition is done, keep it cheap.
pub trait StateChangeListener: Sync + Send {
    /// `on_transform` is triggered when the circuit of `resource` moved from `prev` to `current.status`.
    fn on_transform(&self, resource: &Resource, prev: Status, current: &CircuitBreakerStatus);
}

/// `LoggingStateChangeListener` logs every transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingStateChangeListener;

impl StateChangeListener for LoggingStateChangeListener {
    fn on_transform(&self, resource: &Resource, prev: Status, current: &CircuitBreakerStatus) {
        logging::info!(
            "[CircuitBreaker StateChange] {} from {} to {}",
            resource,
            prev,
            current
        );
    }
}

/// `BreakerContext` is what the circuit states of an engine share.
pub struct BreakerContext {
    pub bucket_count: u32,
    /// used unless the rule overrides it
    pub max_half_open_requests: u32,
    pub regexes: Arc<RegexCache>,
    pub listeners: Vec<Arc<dyn StateChangeListener>>,
}

impl std::fmt::Debug for BreakerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerContext")
            .field("bucket_count", &self.bucket_count)
            .field("max_half_open_requests", &self.max_half_open_requests)
            .field("regexes", &self.regexes)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// `ResourceCircuitState` is the circuit of a single resource, built from the rule resolved for it.
#[derive(Debug)]
pub struct ResourceCircuitState {
    resource: Resource,
    rule: Arc<Rule>,
    blocks: Vec<BlockCounters>,
    half_open: HalfOpenProbe,
    /// probes admitted before this time are considered lost afterwards
    probe_deadline_ms: AtomicU64,
    status: RwLock<Arc<CircuitBreakerStatus>>,
    last_access_ms: AtomicU64,
    destroyed: AtomicBool,
    ctx: Arc<BreakerContext>,
}

impl ResourceCircuitState {
    /// `new` builds a closed circuit guarded by the given block configs of the rule.
    pub fn new(
        resource: Resource,
        rule: Arc<Rule>,
        block_configs: &[&BlockConfig],
        ctx: Arc<BreakerContext>,
        now: u64,
    ) -> Result<Self> {
        let blocks = block_configs
            .iter()
            .map(|config| BlockCounters::new(config, ctx.bucket_count, &ctx.regexes))
            .collect::<Result<Vec<_>>>()?;
        let recover = &rule.recover_condition;
        let half_open = HalfOpenProbe::new(
            recover
                .max_half_open_requests
                .unwrap_or(ctx.max_half_open_requests),
            recover.consecutive_success,
        );
        let status = CircuitBreakerStatus::new(rule.name.clone(), Status::Close, "", now);
        Ok(ResourceCircuitState {
            resource,
            blocks,
            half_open,
            probe_deadline_ms: AtomicU64::new(0),
            status: RwLock::new(Arc::new(status)),
            last_access_ms: AtomicU64::new(now),
            destroyed: AtomicBool::new(false),
            rule,
            ctx,
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    pub fn revision(&self) -> &str {
        &self.rule.revision
    }

    pub fn blocks(&self) -> &[BlockCounters] {
        &self.blocks
    }

    pub fn half_open(&self) -> &HalfOpenProbe {
        &self.half_open
    }

    /// `status` returns a snapshot of the current status, a destroyed circuit reports closed.
    pub fn status(&self) -> CircuitBreakerStatus {
        if self.is_destroyed() {
            return CircuitBreakerStatus::close();
        }
        (**self.status.read().unwrap()).clone()
    }

    #[inline]
    pub fn current_status(&self) -> Status {
        if self.is_destroyed() {
            return Status::Destroyed;
        }
        self.status.read().unwrap().status
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn last_access_ms(&self) -> u64 {
        self.last_access_ms.load(Ordering::SeqCst)
    }

    pub fn touch(&self, now: u64) {
        self.last_access_ms.fetch_max(now, Ordering::SeqCst);
    }

    /// `preferred_tick_ms` is the smallest bucket width among the sliding windows of the circuit.
    pub fn preferred_tick_ms(&self) -> Option<u64> {
        self.blocks
            .iter()
            .flat_map(|b| b.triggers().iter())
            .filter_map(|t| t.bucket_len_ms())
            .min()
    }

    /// `try_acquire_probe` admits a trial call in half-open state.
    pub fn try_acquire_probe(&self) -> bool {
        if self.current_status() != Status::HalfOpen {
            return false;
        }
        self.half_open.try_acquire()
    }

    /// `release_probe` returns a probe slot taken by `try_acquire_probe` for a call that is not sent.
    pub(crate) fn release_probe(&self) {
        self.half_open.release();
    }

    /// `report_with_time` records a completed call and handles the state transformation.
    /// It returns true only if this call transformed the state.
    pub fn report_with_time(&self, outcome: &Outcome, now: u64) -> bool {
        if self.is_destroyed() || outcome.ret_status() == RetStatus::Reject {
            return false;
        }
        self.touch(now);
        match self.current_status() {
            Status::Close => {
                let mut reason = None;
                // every block config sees the outcome, even after one is satisfied
                for block in &self.blocks {
                    let satisfied = block.record_with_time(now, outcome);
                    if reason.is_none() {
                        reason = satisfied;
                    }
                }
                match reason {
                    Some(reason) => self.from_closed_to_open(reason, now),
                    None => false,
                }
            }
            Status::HalfOpen => {
                let failure = self
                    .blocks
                    .iter()
                    .find(|b| b.is_probe_failure(outcome));
                let verdict = self.half_open.on_probe_result(failure.is_none());
                match verdict {
                    ProbeVerdict::Pending => false,
                    ProbeVerdict::Close => self.from_half_open_to_closed(now),
                    ProbeVerdict::Reopen => {
                        let reason = format!(
                            "probe failed, block config {:?}, ret code: {}, delay: {}ms",
                            failure.map_or("", |b| b.name()),
                            outcome.ret_code(),
                            outcome.delay_ms()
                        );
                        self.from_half_open_to_open(reason, now)
                    }
                }
            }
            Status::Open | Status::Destroyed => false,
        }
    }

    /// `evaluate_with_time` handles the time driven transformations.
    /// It returns true only if this call transformed the state.
    pub fn evaluate_with_time(&self, now: u64) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let current = Arc::clone(&self.status.read().unwrap());
        let sleep_window_ms = self.rule.recover_condition.sleep_window_ms;
        match current.status {
            Status::Close => match self.blocks.iter().find_map(|b| b.check_with_time(now)) {
                Some(reason) => self.from_closed_to_open(reason, now),
                None => false,
            },
            Status::Open => {
                if now >= current.start_time_ms.saturating_add(sleep_window_ms) {
                    self.from_open_to_half_open(now)
                } else {
                    false
                }
            }
            Status::HalfOpen => {
                let deadline = self.probe_deadline_ms.load(Ordering::SeqCst);
                if now >= deadline && self.half_open.in_flight() > 0 {
                    logging::debug!(
                        "[CircuitBreaker ResourceCircuitState] Release {} lost probes of {}",
                        self.half_open.in_flight(),
                        self.resource
                    );
                    self.half_open.release_all();
                    self.probe_deadline_ms
                        .store(now.saturating_add(sleep_window_ms), Ordering::SeqCst);
                }
                false
            }
            Status::Destroyed => false,
        }
    }

    /// `destroy` moves the circuit to the terminal state, it is idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut status = self.status.write().unwrap();
        let next = CircuitBreakerStatus::new(
            self.rule.name.clone(),
            Status::Destroyed,
            "destroyed",
            status.start_time_ms,
        );
        *status = Arc::new(next);
        logging::debug!(
            "[CircuitBreaker ResourceCircuitState] Destroy the circuit of {}",
            self.resource
        );
    }

    /// from_closed_to_open updates circuit breaker state machine from closed to open.
    /// Return true only if current thread successfully accomplished the transformation.
    pub fn from_closed_to_open(&self, reason: String, now: u64) -> bool {
        self.transform(Status::Close, Status::Open, reason, now)
    }

    /// from_open_to_half_open updates circuit breaker state machine from open to half-open.
    /// Return true only if current thread successfully accomplished the transformation.
    pub fn from_open_to_half_open(&self, now: u64) -> bool {
        self.transform(
            Status::Open,
            Status::HalfOpen,
            "sleep window elapsed".into(),
            now,
        )
    }

    /// from_half_open_to_open updates circuit breaker state machine from half-open to open.
    /// Return true only if current thread successfully accomplished the transformation.
    pub fn from_half_open_to_open(&self, reason: String, now: u64) -> bool {
        self.transform(Status::HalfOpen, Status::Open, reason, now)
    }

    /// from_half_open_to_closed updates circuit breaker state machine from half-open to closed.
    /// Return true only if current thread successfully accomplished the transformation.
    pub fn from_half_open_to_closed(&self, now: u64) -> bool {
        let reason = format!(
            "{} consecutive probes succeeded",
            self.rule.recover_condition.consecutive_success
        );
        self.transform(Status::HalfOpen, Status::Close, reason, now)
    }

    fn transform(&self, from: Status, to: Status, reason: String, now: u64) -> bool {
        let mut status = self.status.write().unwrap();
        // checked under the lock, `destroy` takes it too
        if self.is_destroyed() || status.status != from {
            return false;
        }
        let mut next = CircuitBreakerStatus::new(self.rule.name.clone(), to, reason, now);
        match to {
            Status::Open => {
                next = next.with_fallback(self.rule.fallback().cloned());
            }
            Status::HalfOpen => {
                self.half_open.reset();
                self.probe_deadline_ms.store(
                    now.saturating_add(self.rule.recover_condition.sleep_window_ms),
                    Ordering::SeqCst,
                );
            }
            Status::Close => {
                self.half_open.reset();
                for block in &self.blocks {
                    block.reset();
                }
            }
            Status::Destroyed => {}
        }
        let next = Arc::new(next);
        *status = Arc::clone(&next);
        drop(status);

        for listener in &self.ctx.listeners {
            listener.on_transform(&self.resource, from, &next);
        }
        true
    }
}

#[cfg(test)]
pub(crate) use test::MockStateListener;

#[cfg(test)]
mod test {
    use super::*;
    use crate::circuitbreaker::{FallbackConfig, FallbackResponse, RecoverCondition, TriggerCondition};
    use mockall::predicate::*;
    use mockall::*;

    mock! {
        pub(crate) StateListener {}
        impl StateChangeListener for StateListener {
            fn on_transform(&self, resource: &Resource, prev: Status, current: &CircuitBreakerStatus);
        }
    }

    const NOW: u64 = 1596199310000;

    fn rule() -> Arc<Rule> {
        Arc::new(Rule {
            name: "echo-errors".into(),
            block_configs: vec![BlockConfig {
                name: "failure".into(),
                trigger_conditions: vec![TriggerCondition::ConsecutiveError { error_count: 3 }],
                ..Default::default()
            }],
            recover_condition: RecoverCondition {
                sleep_window_ms: 1000,
                consecutive_success: 2,
                max_half_open_requests: Some(2),
            },
            fallback_config: Some(FallbackConfig {
                enable: true,
                response: FallbackResponse {
                    code: 503,
                    body: "echo is down".into(),
                    ..Default::default()
                },
            }),
            ..Default::default()
        })
    }

    fn context(listeners: Vec<Arc<dyn StateChangeListener>>) -> Arc<BreakerContext> {
        Arc::new(BreakerContext {
            bucket_count: 10,
            max_half_open_requests: 3,
            regexes: Arc::new(RegexCache::new(16)),
            listeners,
        })
    }

    fn new_state(listeners: Vec<Arc<dyn StateChangeListener>>) -> ResourceCircuitState {
        let rule = rule();
        let configs: Vec<&BlockConfig> = rule.block_configs.iter().collect();
        ResourceCircuitState::new(
            Resource::service("default", "echo"),
            Arc::clone(&rule),
            &configs,
            context(listeners),
            NOW,
        )
        .unwrap()
    }

    fn outcome(status: RetStatus) -> Outcome {
        Outcome::new(Resource::service("default", "echo"), 0, 10, status)
    }

    #[test]
    fn full_cycle() {
        let state = new_state(vec![Arc::new(LoggingStateChangeListener)]);
        assert_eq!(state.current_status(), Status::Close);
        assert!(!state.report_with_time(&outcome(RetStatus::Fail), NOW));
        assert!(!state.report_with_time(&outcome(RetStatus::Fail), NOW + 1));
        assert!(state.report_with_time(&outcome(RetStatus::Fail), NOW + 2));

        let status = state.status();
        assert_eq!(status.status, Status::Open);
        assert_eq!(status.rule_name, "echo-errors");
        assert_eq!(status.start_time_ms, NOW + 2);
        assert!(status.reason.contains("failure"));
        assert_eq!(status.fallback_info.as_ref().unwrap().code, 503);
        assert!(!status.is_available());

        // open, outcomes change nothing
        assert!(!state.report_with_time(&outcome(RetStatus::Success), NOW + 3));
        assert!(!state.try_acquire_probe());
        assert!(!state.evaluate_with_time(NOW + 1001));
        assert!(state.evaluate_with_time(NOW + 1002));
        assert_eq!(state.current_status(), Status::HalfOpen);
        assert!(state.status().fallback_info.is_none());

        assert!(state.try_acquire_probe());
        assert!(state.try_acquire_probe());
        assert!(!state.try_acquire_probe());
        assert!(!state.report_with_time(&outcome(RetStatus::Success), NOW + 1010));
        assert!(state.report_with_time(&outcome(RetStatus::Success), NOW + 1011));
        assert_eq!(state.current_status(), Status::Close);
        assert_eq!(state.half_open().in_flight(), 0);

        // counters start over after closing
        assert!(!state.report_with_time(&outcome(RetStatus::Fail), NOW + 1012));
        assert!(!state.report_with_time(&outcome(RetStatus::Fail), NOW + 1013));
        assert_eq!(state.current_status(), Status::Close);
    }

    #[test]
    fn probe_failure_reopens() {
        let state = new_state(Vec::new());
        for i in 0..3 {
            state.report_with_time(&outcome(RetStatus::Timeout), NOW + i);
        }
        assert!(state.evaluate_with_time(NOW + 2000));
        assert!(state.try_acquire_probe());
        assert!(state.report_with_time(&outcome(RetStatus::Fail), NOW + 2001));
        let status = state.status();
        assert_eq!(status.status, Status::Open);
        assert!(status.reason.contains("probe failed"));
        // the sleep window starts over
        assert_eq!(status.start_time_ms, NOW + 2001);
        assert!(!state.evaluate_with_time(NOW + 2500));
        assert!(state.evaluate_with_time(NOW + 3001));
    }

    #[test]
    fn rejected_outcomes_are_ignored() {
        let state = new_state(Vec::new());
        for i in 0..10 {
            assert!(!state.report_with_time(&outcome(RetStatus::Reject), NOW + i));
        }
        assert_eq!(state.current_status(), Status::Close);
        assert_eq!(state.last_access_ms(), NOW);
    }

    #[test]
    fn lost_probes_are_released() {
        let state = new_state(Vec::new());
        for i in 0..3 {
            state.report_with_time(&outcome(RetStatus::Fail), NOW + i);
        }
        assert!(state.evaluate_with_time(NOW + 1002));
        assert!(state.try_acquire_probe());
        assert!(state.try_acquire_probe());
        assert!(!state.try_acquire_probe());
        assert!(!state.evaluate_with_time(NOW + 1500));
        assert!(!state.try_acquire_probe());
        assert!(!state.evaluate_with_time(NOW + 2002));
        assert!(state.try_acquire_probe());
        assert_eq!(state.current_status(), Status::HalfOpen);
    }

    #[test]
    fn destroyed_is_terminal() {
        let state = new_state(Vec::new());
        for i in 0..3 {
            state.report_with_time(&outcome(RetStatus::Fail), NOW + i);
        }
        state.destroy();
        state.destroy();
        assert!(state.is_destroyed());
        assert_eq!(state.current_status(), Status::Destroyed);
        assert_eq!(state.status(), CircuitBreakerStatus::close());
        assert!(!state.evaluate_with_time(NOW + 5000));
        assert!(!state.report_with_time(&outcome(RetStatus::Fail), NOW + 5001));
        assert!(!state.try_acquire_probe());
    }

    #[test]
    fn listeners_are_notified() {
        let mut listener = MockStateListener::new();
        let mut seq = Sequence::new();
        listener
            .expect_on_transform()
            .with(always(), eq(Status::Close), function(|s: &CircuitBreakerStatus| s.status == Status::Open))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        listener
            .expect_on_transform()
            .with(always(), eq(Status::Open), function(|s: &CircuitBreakerStatus| s.status == Status::HalfOpen))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        let state = new_state(vec![Arc::new(listener)]);
        for i in 0..3 {
            state.report_with_time(&outcome(RetStatus::Fail), NOW + i);
        }
        state.evaluate_with_time(NOW + 1002);
        // not a defined edge
        assert!(!state.from_closed_to_open("again".into(), NOW + 1003));
    }

    #[test]
    fn preferred_tick() {
        let state = new_state(Vec::new());
        assert_eq!(state.preferred_tick_ms(), None);

        let rule = Arc::new(Rule {
            name: "rate".into(),
            block_configs: vec![BlockConfig {
                name: "rate".into(),
                trigger_conditions: vec![
                    TriggerCondition::ErrorRate {
                        error_rate: 0.5,
                        interval_ms: 10000,
                        minimum_request: 10,
                    },
                    TriggerCondition::SlowRate {
                        max_rt_ms: 100,
                        slow_rate: 0.5,
                        interval_ms: 2000,
                        minimum_request: 10,
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        });
        let configs: Vec<&BlockConfig> = rule.block_configs.iter().collect();
        let state = ResourceCircuitState::new(
            Resource::service("default", "echo"),
            Arc::clone(&rule),
            &configs,
            context(Vec::new()),
            NOW,
        )
        .unwrap();
        assert_eq!(state.preferred_tick_ms(), Some(200));
        // rule default
        assert_eq!(state.half_open().max_requests(), 3);
    }
}
