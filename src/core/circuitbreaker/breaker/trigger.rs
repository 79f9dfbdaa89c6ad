use crate::base::{Outcome, RetStatus};
use crate::circuitbreaker::{BlockConfig, CompiledMatch, ErrorCondition, RegexCache, TriggerCondition};
use crate::stat::{CounterLeapArray, StatDimension};
use crate::{logging, Result};
use std::sync::atomic::{AtomicU32, Ordering};

/// The statistic behind a trigger condition.
#[derive(Debug)]
enum TriggerStat {
    /// reset to zero on any success
    Consecutive(AtomicU32),
    Window(CounterLeapArray),
}

/// `TriggerCounter` evaluates one trigger condition of a block config.
#[derive(Debug)]
pub struct TriggerCounter {
    block_config: String,
    condition: TriggerCondition,
    stat: TriggerStat,
}

impl TriggerCounter {
    pub fn new(block_config: &str, condition: TriggerCondition, bucket_count: u32) -> Result<Self> {
        let stat = match condition {
            TriggerCondition::ConsecutiveError { .. } => TriggerStat::Consecutive(AtomicU32::new(0)),
            TriggerCondition::ErrorRate { interval_ms, .. }
            | TriggerCondition::SlowRate { interval_ms, .. } => {
                TriggerStat::Window(CounterLeapArray::new(bucket_count, interval_ms)?)
            }
        };
        Ok(TriggerCounter {
            block_config: block_config.to_owned(),
            condition,
            stat,
        })
    }

    pub fn condition(&self) -> &TriggerCondition {
        &self.condition
    }

    /// `record_with_time` accounts a call, and returns the reason to open the circuit
    /// if the trigger is satisfied afterwards.
    pub fn record_with_time(&self, now: u64, is_error: bool, delay_ms: u64) -> Option<String> {
        match (&self.condition, &self.stat) {
            (TriggerCondition::ConsecutiveError { .. }, TriggerStat::Consecutive(counter)) => {
                if is_error {
                    counter.fetch_add(1, Ordering::SeqCst);
                } else {
                    counter.store(0, Ordering::SeqCst);
                    return None;
                }
            }
            (TriggerCondition::ErrorRate { .. }, TriggerStat::Window(stat)) => {
                self.add(stat, now, StatDimension::Request);
                if is_error {
                    self.add(stat, now, StatDimension::Failure);
                }
            }
            (TriggerCondition::SlowRate { max_rt_ms, .. }, TriggerStat::Window(stat)) => {
                self.add(stat, now, StatDimension::Request);
                if delay_ms >= *max_rt_ms {
                    self.add(stat, now, StatDimension::Slow);
                }
            }
            _ => return None,
        }
        self.check_with_time(now)
    }

    fn add(&self, stat: &CounterLeapArray, now: u64, dim: StatDimension) {
        if let Err(err) = stat.add_with_time(now, dim, 1) {
            logging::debug!(
                "[CircuitBreaker TriggerCounter] Drop a stale record, block config: {}, reason: {:?}",
                self.block_config,
                err
            );
        }
    }

    /// `check_with_time` returns the reason to open the circuit if the trigger is satisfied at `now`.
    pub fn check_with_time(&self, now: u64) -> Option<String> {
        match (&self.condition, &self.stat) {
            (TriggerCondition::ConsecutiveError { error_count }, TriggerStat::Consecutive(counter)) => {
                let errors = counter.load(Ordering::SeqCst);
                if errors >= *error_count {
                    Some(format!(
                        "block config {:?}: {} consecutive errors reached the threshold {}",
                        self.block_config, errors, error_count
                    ))
                } else {
                    None
                }
            }
            (
                TriggerCondition::ErrorRate {
                    error_rate,
                    minimum_request,
                    ..
                },
                TriggerStat::Window(stat),
            ) => self.check_ratio(stat, now, StatDimension::Failure, *error_rate, *minimum_request, "error rate"),
            (
                TriggerCondition::SlowRate {
                    slow_rate,
                    minimum_request,
                    ..
                },
                TriggerStat::Window(stat),
            ) => self.check_ratio(stat, now, StatDimension::Slow, *slow_rate, *minimum_request, "slow rate"),
            _ => None,
        }
    }

    fn check_ratio(
        &self,
        stat: &CounterLeapArray,
        now: u64,
        dim: StatDimension,
        threshold: f64,
        minimum_request: u32,
        name: &str,
    ) -> Option<String> {
        let total = stat.sum_with_time(now, StatDimension::Request);
        // not enough signal in the window
        if total == 0 || total < minimum_request as u64 {
            return None;
        }
        let target = stat.sum_with_time(now, dim);
        let ratio = target as f64 / total as f64;
        if ratio >= threshold {
            Some(format!(
                "block config {:?}: {} {:.2} ({}/{}) reached the threshold {:.2}",
                self.block_config, name, ratio, target, total, threshold
            ))
        } else {
            None
        }
    }

    /// the bucket width of the sliding window, if the trigger has one
    pub fn bucket_len_ms(&self) -> Option<u64> {
        match &self.stat {
            TriggerStat::Window(stat) => Some(stat.bucket_len_ms()),
            TriggerStat::Consecutive(_) => None,
        }
    }

    pub fn reset(&self) {
        match &self.stat {
            TriggerStat::Consecutive(counter) => counter.store(0, Ordering::SeqCst),
            TriggerStat::Window(stat) => stat.reset(),
        }
    }
}

/// An `ErrorCondition` ready for the report path.
#[derive(Debug)]
enum ErrorMatcher {
    RetCode(CompiledMatch),
    Delay(u64),
}

impl ErrorMatcher {
    fn new(cond: &ErrorCondition, regexes: &RegexCache) -> Self {
        match cond {
            ErrorCondition::RetCode { pattern } => ErrorMatcher::RetCode(CompiledMatch::new(pattern, regexes)),
            ErrorCondition::Delay { max_delay_ms } => ErrorMatcher::Delay(*max_delay_ms),
        }
    }

    fn is_error(&self, outcome: &Outcome) -> bool {
        match self {
            ErrorMatcher::RetCode(pattern) => pattern.matches(&outcome.ret_code().to_string()),
            ErrorMatcher::Delay(max_delay_ms) => outcome.delay_ms() >= *max_delay_ms,
        }
    }
}

/// `BlockCounters` holds the triggers of a block config,
/// together with the error conditions that classify the outcomes fed into them.
#[derive(Debug)]
pub struct BlockCounters {
    name: String,
    error_conditions: Vec<ErrorMatcher>,
    triggers: Vec<TriggerCounter>,
}

impl BlockCounters {
    /// `new` compiles the return code patterns once, reports never go through `regexes`.
    pub fn new(block_config: &BlockConfig, bucket_count: u32, regexes: &RegexCache) -> Result<Self> {
        let triggers = block_config
            .trigger_conditions
            .iter()
            .map(|cond| TriggerCounter::new(&block_config.name, cond.clone(), bucket_count))
            .collect::<Result<Vec<_>>>()?;
        Ok(BlockCounters {
            name: block_config.name.clone(),
            error_conditions: block_config
                .error_conditions
                .iter()
                .map(|cond| ErrorMatcher::new(cond, regexes))
                .collect(),
            triggers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triggers(&self) -> &[TriggerCounter] {
        &self.triggers
    }

    /// `is_error` classifies the outcome with the error conditions,
    /// without any condition, failed and timed-out calls are errors.
    pub fn is_error(&self, outcome: &Outcome) -> bool {
        if self.error_conditions.is_empty() {
            return outcome.ret_status().is_failure();
        }
        self.error_conditions.iter().any(|cond| cond.is_error(outcome))
    }

    /// `is_probe_failure` tells whether a half-open probe failed in the view of this block config,
    /// a probe is failed when it is an error, or slower than any slow-rate trigger allows.
    pub fn is_probe_failure(&self, outcome: &Outcome) -> bool {
        if outcome.ret_status() == RetStatus::Reject {
            return false;
        }
        self.is_error(outcome)
            || self.triggers.iter().any(|t| match t.condition() {
                TriggerCondition::SlowRate { max_rt_ms, .. } => outcome.delay_ms() >= *max_rt_ms,
                _ => false,
            })
    }

    /// `record_with_time` feeds the outcome into every trigger,
    /// and returns the reason of the first satisfied one.
    pub fn record_with_time(&self, now: u64, outcome: &Outcome) -> Option<String> {
        let is_error = self.is_error(outcome);
        let mut reason = None;
        for trigger in &self.triggers {
            let satisfied = trigger.record_with_time(now, is_error, outcome.delay_ms());
            if reason.is_none() {
                reason = satisfied;
            }
        }
        reason
    }

    pub fn check_with_time(&self, now: u64) -> Option<String> {
        self.triggers.iter().find_map(|t| t.check_with_time(now))
    }

    pub fn reset(&self) {
        for trigger in &self.triggers {
            trigger.reset();
        }
    }
}
