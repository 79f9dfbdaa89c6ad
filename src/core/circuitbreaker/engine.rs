use super::*;
use crate::base::{Outcome, Resource, ServiceKey};
use crate::config::{
    CircuitBreakerConfig, AUTO_CHECK_PERIOD_MS, DEFAULT_CHECK_PERIOD_MS, MAX_SWEEP_PERIOD_MS,
    MIN_CHECK_PERIOD_MS,
};
use crate::{logging, utils, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

const SCHEDULER_NAME: &str = "meshguard-cb-scheduler";

/// `EngineBuilder` assembles a `CircuitBreakerEngine` from its collaborators.
pub struct EngineBuilder {
    rule_source: Arc<dyn RuleSource>,
    config: CircuitBreakerConfig,
    listeners: Vec<Arc<dyn StateChangeListener>>,
    precedence: MatchPrecedence,
    compile: Option<Box<CompileFn>>,
    scheduler: bool,
}

impl EngineBuilder {
    pub fn new(rule_source: Arc<dyn RuleSource>) -> Self {
        EngineBuilder {
            rule_source,
            config: CircuitBreakerConfig::default(),
            listeners: Vec::new(),
            precedence: MatchPrecedence::default(),
            compile: None,
            scheduler: true,
        }
    }

    pub fn with_config(mut self, config: CircuitBreakerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn StateChangeListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_match_precedence(mut self, precedence: MatchPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// `with_compile_fn` replaces the compilation of the path and return code patterns.
    pub fn with_compile_fn(mut self, compile: Box<CompileFn>) -> Self {
        self.compile = Some(compile);
        self
    }

    /// `without_scheduler` leaves the time driven transitions and the expiry sweep
    /// to explicit `evaluate` and `cleanup_expired_resources` calls.
    pub fn without_scheduler(mut self) -> Self {
        self.scheduler = false;
        self
    }

    /// `build()` would consume EngineBuilder
    pub fn build(self) -> Result<CircuitBreakerEngine> {
        self.config.check()?;
        let capacity = self.config.regex_cache_capacity;
        let regexes = Arc::new(match self.compile {
            Some(compile) => RegexCache::with_compile_fn(capacity, compile),
            None => RegexCache::new(capacity),
        });
        let ctx = Arc::new(BreakerContext {
            bucket_count: self.config.bucket_count,
            max_half_open_requests: self.config.max_half_open_requests,
            regexes: Arc::clone(&regexes),
            listeners: self.listeners,
        });
        let core = Arc::new(EngineCore {
            resolver: RuleResolver::new(regexes, self.precedence),
            rule_source: self.rule_source,
            cache: ResourceStateCache::new(),
            ctx,
            destroyed: AtomicBool::new(false),
            last_sweep_ms: AtomicU64::new(utils::curr_time_millis()),
            config: self.config,
        });
        let scheduler = if self.scheduler && core.config.enable {
            Some(Scheduler::start(SCHEDULER_NAME, Arc::downgrade(&core))?)
        } else {
            None
        };
        logging::info!(
            "[CircuitBreaker Engine] Engine built, config: {:?}, precedence: {:?}",
            core.config,
            core.resolver.precedence()
        );
        Ok(CircuitBreakerEngine {
            core,
            scheduler: Mutex::new(scheduler),
        })
    }
}

/// The shared part of the engine, also reachable from the scheduler and the rule change adaptor.
struct EngineCore {
    config: CircuitBreakerConfig,
    rule_source: Arc<dyn RuleSource>,
    resolver: RuleResolver,
    cache: ResourceStateCache,
    ctx: Arc<BreakerContext>,
    destroyed: AtomicBool,
    last_sweep_ms: AtomicU64,
}

impl EngineCore {
    #[inline]
    fn is_active(&self) -> bool {
        self.config.enable && !self.destroyed.load(Ordering::SeqCst)
    }

    fn build_value(&self, resource: &Resource, caller: Option<&ServiceKey>, now: u64) -> CounterValue {
        let rules = match self.rule_source.rules_of(resource.service_key()) {
            Some(rules) => rules,
            None => return CounterValue::NotConfigured,
        };
        let rule = match self.resolver.resolve(resource, caller, &rules.rules) {
            Some(rule) => rule,
            None => return CounterValue::NotConfigured,
        };
        let block_configs = self.resolver.active_block_configs(&rule, resource);
        if block_configs.is_empty() {
            return CounterValue::NotConfigured;
        }
        match ResourceCircuitState::new(
            resource.clone(),
            Arc::clone(&rule),
            &block_configs,
            Arc::clone(&self.ctx),
            now,
        ) {
            Ok(state) => {
                logging::debug!(
                    "[CircuitBreaker Engine] Circuit of {} built from rule {:?}, revision: {}",
                    resource,
                    rule.name,
                    rules.revision
                );
                CounterValue::Tracking(Arc::new(state))
            }
            Err(err) => {
                logging::warn!(
                    "[CircuitBreaker Engine] Fail to build the circuit of {} from rule {:?}, reason: {:?}",
                    resource,
                    rule.name,
                    err
                );
                CounterValue::NotConfigured
            }
        }
    }

    /// the tracked states of the resource and its parents, from the most specific one
    fn existing_states(&self, resource: &Resource) -> Vec<Arc<ResourceCircuitState>> {
        let mut states = Vec::new();
        if let Some(CounterValue::Tracking(state)) = self.cache.get(resource) {
            states.push(state);
        }
        for parent in resource.parents() {
            if let Some(CounterValue::Tracking(state)) = self.cache.get(&parent) {
                states.push(state);
            }
        }
        states
    }

    fn invalidate(&self, service: &ServiceKey) -> usize {
        let removed = self.cache.remove_service(service);
        logging::debug!(
            "[CircuitBreaker Engine] {} cached circuits of {} were invalidated",
            removed,
            service
        );
        removed
    }

    fn cleanup_expired_with_time(&self, now: u64) -> usize {
        let removed = self
            .cache
            .cleanup_expired_with_time(now, self.config.counters_expire_interval_ms);
        if removed > 0 {
            logging::debug!(
                "[CircuitBreaker Engine] {} idle resources were swept, {} left",
                removed,
                self.cache.len()
            );
        }
        removed
    }

    fn sweep_period_ms(&self) -> u64 {
        self.config
            .counters_expire_interval_ms
            .min(MAX_SWEEP_PERIOD_MS)
    }
}

impl Tick for EngineCore {
    fn period_ms(&self) -> u64 {
        let period = if self.config.check_period_ms != AUTO_CHECK_PERIOD_MS {
            self.config.check_period_ms
        } else {
            self.cache
                .states()
                .iter()
                .filter_map(|state| state.preferred_tick_ms())
                .min()
                .unwrap_or(DEFAULT_CHECK_PERIOD_MS)
                .min(DEFAULT_CHECK_PERIOD_MS)
        };
        period.min(self.sweep_period_ms()).max(MIN_CHECK_PERIOD_MS)
    }

    fn tick(&self, now: u64) {
        if !self.is_active() {
            return;
        }
        for state in self.cache.states() {
            let evaluated = panic::catch_unwind(AssertUnwindSafe(|| state.evaluate_with_time(now)));
            if let Err(err) = evaluated {
                let reason = err
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| err.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                logging::error!(
                    "[CircuitBreaker Engine] Fail to evaluate the circuit of {}, reason: {}",
                    state.resource(),
                    reason
                );
            }
        }
        let last_sweep = self.last_sweep_ms.load(Ordering::SeqCst);
        if now >= last_sweep.saturating_add(self.sweep_period_ms())
            && self
                .last_sweep_ms
                .compare_exchange(last_sweep, now, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            self.cleanup_expired_with_time(now);
        }
    }
}

/// `CircuitBreakerEngine` is the facade of the circuit breaking:
/// outcomes are reported to it, and the routing layer asks it which resources may be called.
pub struct CircuitBreakerEngine {
    core: Arc<EngineCore>,
    scheduler: Mutex<Option<Scheduler>>,
}

impl std::fmt::Debug for CircuitBreakerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerEngine")
            .field("config", &self.core.config)
            .field("resources", &self.core.cache.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl CircuitBreakerEngine {
    pub fn builder(rule_source: Arc<dyn RuleSource>) -> EngineBuilder {
        EngineBuilder::new(rule_source)
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.core.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.core.destroyed.load(Ordering::SeqCst)
    }

    /// `report` records the outcome of a completed call at the time it was observed,
    /// a timestamp ahead of the local clock is taken as now.
    /// It returns true only if the outcome transformed the circuit state of its resource.
    pub fn report(&self, outcome: &Outcome) -> bool {
        let now = utils::curr_time_millis();
        self.report_with_time(outcome, outcome.timestamp_ms().min(now))
    }

    pub fn report_with_time(&self, outcome: &Outcome, now: u64) -> bool {
        if !self.core.is_active() {
            return false;
        }
        let resource = outcome.resource();
        let value = self.core.cache.get_or_create(resource, now, || {
            self.core.build_value(resource, outcome.caller(), now)
        });
        if self.is_destroyed() {
            // lost the race with `destroy`, which may have cleared the cache before the insert
            self.core.cache.clear();
            return false;
        }
        match value {
            CounterValue::Tracking(state) => state.report_with_time(outcome, now),
            CounterValue::NotConfigured => false,
        }
    }

    /// `check_resource` returns the status of the most specific tracked circuit
    /// among the resource and its parents, or a closed status if none exists.
    /// It never creates any circuit.
    pub fn check_resource(&self, resource: &Resource) -> CircuitBreakerStatus {
        if !self.core.is_active() {
            return CircuitBreakerStatus::close();
        }
        match self.core.existing_states(resource).first() {
            Some(state) => state.status(),
            None => CircuitBreakerStatus::close(),
        }
    }

    /// `acquire_permission` decides whether a call to the resource may be sent.
    pub fn acquire_permission(&self, resource: &Resource) -> CheckResult {
        self.acquire_permission_with_time(resource, utils::curr_time_millis())
    }

    /// Every tracked circuit among the resource and its parents must admit the call,
    /// a half-open circuit admits it only as one of its bounded probes.
    pub fn acquire_permission_with_time(&self, resource: &Resource, now: u64) -> CheckResult {
        if !self.core.is_active() {
            return CheckResult::pass();
        }
        let states = self.core.existing_states(resource);
        // an open circuit whose sleep window elapsed starts probing without waiting for the scheduler
        for state in &states {
            if state.current_status() == Status::Open {
                state.evaluate_with_time(now);
            }
        }
        for state in &states {
            let status = state.status();
            if status.status == Status::Open {
                return CheckResult::blocked(status.rule_name, status.fallback_info);
            }
        }
        let mut probing: Vec<&Arc<ResourceCircuitState>> = Vec::new();
        for state in &states {
            if state.current_status() != Status::HalfOpen {
                continue;
            }
            if state.try_acquire_probe() {
                probing.push(state);
                continue;
            }
            // the call is not sent, the slots taken so far are given back
            for taken in probing {
                taken.release_probe();
            }
            return CheckResult::blocked(state.rule().name.clone(), state.rule().fallback().cloned());
        }
        CheckResult::pass()
    }

    /// `on_rule_changed` discards the cached circuits of the destination service,
    /// they are rebuilt against the current rules on the next report.
    pub fn on_rule_changed(&self, service: &ServiceKey) -> usize {
        if self.is_destroyed() {
            return 0;
        }
        self.core.invalidate(service)
    }

    /// `rule_change_listener` returns a listener to register on the rule source.
    /// It does not keep the engine alive.
    pub fn rule_change_listener(&self) -> Arc<dyn RuleChangeListener> {
        Arc::new(RuleChangeAdaptor {
            core: Arc::downgrade(&self.core),
        })
    }

    pub fn cleanup_expired_resources(&self) -> usize {
        self.cleanup_expired_resources_with_time(utils::curr_time_millis())
    }

    pub fn cleanup_expired_resources_with_time(&self, now: u64) -> usize {
        if self.is_destroyed() {
            return 0;
        }
        self.core.cleanup_expired_with_time(now)
    }

    pub fn resource_count(&self) -> usize {
        self.core.cache.len()
    }

    pub fn resource_count_of(&self, level: crate::base::Level) -> usize {
        self.core.cache.len_of(level)
    }

    /// `evaluate` runs one scheduler tick on the calling thread.
    pub fn evaluate(&self) {
        self.evaluate_with_time(utils::curr_time_millis())
    }

    pub fn evaluate_with_time(&self, now: u64) {
        self.core.tick(now)
    }

    /// `destroy` stops the scheduler and destroys every circuit, it is idempotent.
    /// Once it returns, reports are ignored and every resource is reported closed.
    pub fn destroy(&self) {
        if self.core.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(scheduler) = self.scheduler.lock().unwrap().take() {
            scheduler.stop();
        }
        self.core.cache.clear();
        logging::info!("[CircuitBreaker Engine] Engine destroyed");
    }
}

impl Drop for CircuitBreakerEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}

struct RuleChangeAdaptor {
    core: Weak<EngineCore>,
}

impl RuleChangeListener for RuleChangeAdaptor {
    fn on_rule_changed(
        &self,
        service: &ServiceKey,
        old: Option<Arc<ServiceRules>>,
        new: Option<Arc<ServiceRules>>,
    ) {
        let core = match self.core.upgrade() {
            Some(core) => core,
            None => return,
        };
        if core.destroyed.load(Ordering::SeqCst) {
            return;
        }
        logging::info!(
            "[CircuitBreaker Engine] Rules of {} changed, revision: {:?} -> {:?}",
            service,
            old.map(|r| r.revision.clone()),
            new.map(|r| r.revision.clone())
        );
        core.invalidate(service);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{Level, RetStatus};
    use crate::circuitbreaker::{MockSource, MockStateListener};
    use crate::config::CircuitBreakerConfig;
    use mockall::predicate::*;

    const NOW: u64 = 1596199310000;

    fn service_rules(rules: Vec<Rule>) -> Arc<ServiceRules> {
        Arc::new(ServiceRules {
            revision: "r1".into(),
            rules: rules.into_iter().map(Arc::new).collect(),
        })
    }

    fn consecutive_rule(name: &str, level: Level, error_count: u32) -> Rule {
        Rule {
            name: name.into(),
            level,
            block_configs: vec![BlockConfig {
                name: "failure".into(),
                trigger_conditions: vec![TriggerCondition::ConsecutiveError { error_count }],
                ..Default::default()
            }],
            recover_condition: RecoverCondition {
                sleep_window_ms: 1000,
                consecutive_success: 1,
                max_half_open_requests: Some(1),
            },
            ..Default::default()
        }
    }

    fn engine_with(source: MockSource, listener: Option<MockStateListener>) -> CircuitBreakerEngine {
        let mut builder = EngineBuilder::new(Arc::new(source)).without_scheduler();
        if let Some(listener) = listener {
            builder = builder.with_listener(Arc::new(listener));
        }
        builder.build().unwrap()
    }

    fn fail(resource: &Resource) -> Outcome {
        Outcome::new(resource.clone(), 500, 10, RetStatus::Fail)
    }

    #[test]
    fn unconfigured_resource_is_cached_once() {
        let mut source = MockSource::new();
        source.expect_rules_of().times(1).returning(|_| None);
        let engine = engine_with(source, None);
        let echo = Resource::service("default", "echo");
        for i in 0..10 {
            assert!(!engine.report_with_time(&fail(&echo), NOW + i));
        }
        assert_eq!(engine.resource_count(), 1);
        assert_eq!(engine.check_resource(&echo).status, Status::Close);
        assert!(engine.acquire_permission_with_time(&echo, NOW).pass);
    }

    #[test]
    fn parent_circuit_guards_children() {
        let mut source = MockSource::new();
        source
            .expect_rules_of()
            .with(eq(ServiceKey::new("default", "echo")))
            .returning(|_| Some(service_rules(vec![consecutive_rule("svc", Level::Service, 2)])));
        let mut listener = MockStateListener::new();
        listener
            .expect_on_transform()
            .with(
                eq(Resource::service("default", "echo")),
                eq(Status::Close),
                always(),
            )
            .times(1)
            .return_const(());
        let engine = engine_with(source, Some(listener));
        let echo = Resource::service("default", "echo");
        let method = Resource::method("default", "echo", "/echo");
        assert!(!engine.report_with_time(&fail(&echo), NOW));
        assert!(engine.report_with_time(&fail(&echo), NOW + 1));

        assert_eq!(engine.check_resource(&echo).status, Status::Open);
        // no method state, the service one answers
        assert_eq!(engine.check_resource(&method).status, Status::Open);
        let check = engine.acquire_permission_with_time(&method, NOW + 2);
        assert!(!check.pass);
        assert_eq!(check.rule_name, "svc");
        // querying never grows the cache
        assert_eq!(engine.resource_count(), 1);
        assert_eq!(engine.resource_count_of(Level::Method), 0);
    }

    #[test]
    fn permission_starts_probing() {
        let mut source = MockSource::new();
        source
            .expect_rules_of()
            .returning(|_| Some(service_rules(vec![consecutive_rule("svc", Level::Service, 1)])));
        let engine = engine_with(source, None);
        let echo = Resource::service("default", "echo");
        assert!(engine.report_with_time(&fail(&echo), NOW));
        assert!(!engine.acquire_permission_with_time(&echo, NOW + 999).pass);
        // the single probe slot
        assert!(engine.acquire_permission_with_time(&echo, NOW + 1000).pass);
        assert_eq!(engine.check_resource(&echo).status, Status::HalfOpen);
        assert!(!engine.acquire_permission_with_time(&echo, NOW + 1001).pass);
        let success = Outcome::new(echo.clone(), 200, 10, RetStatus::Success);
        assert!(engine.report_with_time(&success, NOW + 1002));
        assert_eq!(engine.check_resource(&echo).status, Status::Close);
    }

    #[test]
    fn refused_probe_returns_taken_slots() {
        let mut source = MockSource::new();
        source.expect_rules_of().returning(|_| {
            let mut svc = consecutive_rule("svc", Level::Service, 1);
            svc.recover_condition.consecutive_success = 2;
            Some(service_rules(vec![consecutive_rule("method", Level::Method, 1), svc]))
        });
        let engine = engine_with(source, None);
        let echo = Resource::service("default", "echo");
        let method = Resource::method("default", "echo", "/echo");
        assert!(engine.report_with_time(&fail(&method), NOW));
        assert!(engine.report_with_time(&fail(&echo), NOW));

        // the service probe holds the only service slot
        assert!(engine.acquire_permission_with_time(&echo, NOW + 1000).pass);
        let check = engine.acquire_permission_with_time(&method, NOW + 1000);
        assert!(!check.pass);
        assert_eq!(check.rule_name, "svc");
        let method_state = engine.core.cache.get(&method).unwrap().state().cloned().unwrap();
        assert_eq!(method_state.current_status(), Status::HalfOpen);
        assert_eq!(method_state.half_open().in_flight(), 0);

        let success = Outcome::new(echo.clone(), 200, 10, RetStatus::Success);
        assert!(!engine.report_with_time(&success, NOW + 1001));
        assert_eq!(engine.check_resource(&echo).status, Status::HalfOpen);
        let check = engine.acquire_permission_with_time(&method, NOW + 1002);
        assert!(check.pass);
        assert_eq!(method_state.half_open().in_flight(), 1);
    }

    /// Marks the engine destroyed while a circuit is being built,
    /// as a `destroy` finishing between the activity check of a report and its insert.
    struct DestroyingSource {
        core: Mutex<Weak<EngineCore>>,
    }

    impl RuleSource for DestroyingSource {
        fn rules_of(&self, _service: &ServiceKey) -> Option<Arc<ServiceRules>> {
            if let Some(core) = self.core.lock().unwrap().upgrade() {
                core.destroyed.store(true, Ordering::SeqCst);
            }
            Some(service_rules(vec![consecutive_rule("svc", Level::Service, 1)]))
        }
    }

    #[test]
    fn report_racing_destroy_leaves_nothing() {
        let source = Arc::new(DestroyingSource {
            core: Mutex::new(Weak::new()),
        });
        let engine = EngineBuilder::new(source.clone())
            .without_scheduler()
            .build()
            .unwrap();
        *source.core.lock().unwrap() = Arc::downgrade(&engine.core);
        let echo = Resource::service("default", "echo");
        assert!(!engine.report_with_time(&fail(&echo), NOW));
        assert!(engine.is_destroyed());
        assert_eq!(engine.resource_count(), 0);
        assert_eq!(engine.check_resource(&echo).status, Status::Close);
    }

    #[test]
    fn report_uses_observed_time() {
        let mut source = MockSource::new();
        source.expect_rules_of().returning(|_| {
            Some(service_rules(vec![Rule {
                name: "rate".into(),
                block_configs: vec![BlockConfig {
                    name: "rate".into(),
                    trigger_conditions: vec![TriggerCondition::ErrorRate {
                        error_rate: 0.5,
                        interval_ms: 1000,
                        minimum_request: 2,
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }]))
        });
        let engine = engine_with(source, None);
        let echo = Resource::service("default", "echo");
        let now = utils::curr_time_millis();
        let observed = now - 60_000;
        let late = fail(&echo).with_timestamp(observed);
        assert!(!engine.report(&late));
        assert!(engine.report(&late));
        let status = engine.check_resource(&echo);
        assert_eq!(status.status, Status::Open);
        assert_eq!(status.start_time_ms, observed);
        let state = engine.core.cache.get(&echo).unwrap().state().cloned().unwrap();
        assert_eq!(state.last_access_ms(), observed);
        // the failures rolled out of the window long ago
        assert!(state.blocks()[0].check_with_time(now).is_none());

        // a timestamp ahead of the local clock is capped
        engine.report(&fail(&echo).with_timestamp(u64::MAX));
        assert!(state.last_access_ms() >= now);
        assert!(state.last_access_ms() < u64::MAX);
    }

    #[test]
    fn disabled_engine_does_nothing() {
        let mut source = MockSource::new();
        source.expect_rules_of().times(0);
        let engine = EngineBuilder::new(Arc::new(source))
            .with_config(CircuitBreakerConfig {
                enable: false,
                ..Default::default()
            })
            .build()
            .unwrap();
        let echo = Resource::service("default", "echo");
        assert!(!engine.report(&fail(&echo)));
        assert_eq!(engine.resource_count(), 0);
        assert!(engine.acquire_permission(&echo).pass);
    }

    #[test]
    fn invalid_config() {
        let source = MockSource::new();
        let built = EngineBuilder::new(Arc::new(source))
            .with_config(CircuitBreakerConfig {
                bucket_count: 0,
                ..Default::default()
            })
            .build();
        assert!(built.is_err());
    }

    #[test]
    fn tick_period() {
        let mut source = MockSource::new();
        source.expect_rules_of().returning(|_| {
            Some(service_rules(vec![Rule {
                name: "rate".into(),
                block_configs: vec![BlockConfig {
                    name: "rate".into(),
                    trigger_conditions: vec![TriggerCondition::ErrorRate {
                        error_rate: 0.5,
                        interval_ms: 500,
                        minimum_request: 5,
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }]))
        });
        let engine = engine_with(source, None);
        assert_eq!(engine.core.period_ms(), DEFAULT_CHECK_PERIOD_MS);
        engine.report_with_time(&fail(&Resource::service("default", "echo")), NOW);
        assert_eq!(engine.core.period_ms(), 50);

        let fixed = EngineBuilder::new(Arc::new(MockSource::new()))
            .with_config(CircuitBreakerConfig {
                check_period_ms: 1,
                ..Default::default()
            })
            .without_scheduler()
            .build()
            .unwrap();
        assert_eq!(fixed.core.period_ms(), MIN_CHECK_PERIOD_MS);
    }
}
