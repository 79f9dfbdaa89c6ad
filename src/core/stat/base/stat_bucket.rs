use super::{LeapArray, MetricTrait};
use crate::Result;
use enum_map::{Enum, EnumMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// The counters recorded in each bucket of a circuit statistic window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum StatDimension {
    /// every observed call
    Request,
    /// calls classified as errors by the block config
    Failure,
    /// calls slower than the configured max response time
    Slow,
}

/// StatBucket represents the entity to record counters per minimum time unit (i.e. the bucket time span).
/// Note that all operations of the StatBucket are required to be thread-safe.
#[derive(Debug, Default)]
pub struct StatBucket {
    // EnumMap should work as fast as arrays
    counter: EnumMap<StatDimension, AtomicU64>,
}

impl MetricTrait for StatBucket {
    fn reset(&self) {
        for (_, item) in &self.counter {
            item.store(0, Ordering::SeqCst);
        }
    }
}

impl StatBucket {
    pub fn add(&self, dim: StatDimension, count: u64) {
        self.counter[dim].fetch_add(count, Ordering::SeqCst);
    }

    pub fn get(&self, dim: StatDimension) -> u64 {
        self.counter[dim].load(Ordering::SeqCst)
    }
}

/// a specialization of `LeapArray<T>` with `StatBucket`
pub type CounterLeapArray = LeapArray<StatBucket>;

impl CounterLeapArray {
    pub fn add_with_time(&self, now: u64, dim: StatDimension, count: u64) -> Result<()> {
        let bucket = self.get_bucket_of_time(now)?;
        bucket.value().add(dim, count);
        Ok(())
    }

    /// `sum_with_time` sums the given dimension over `[now - interval, now]`
    pub fn sum_with_time(&self, now: u64, dim: StatDimension) -> u64 {
        self.get_valid_values(now)
            .iter()
            .map(|b| b.value().get(dim))
            .sum()
    }
}
