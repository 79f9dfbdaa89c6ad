use crate::utils::div_ceil;
use crate::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const DEFAULT_TIME: u64 = 0;

/// use atomic types to ensure metric's internal mutability
/// otherwise, exclusive Mutex would be necessary on the LeapArray Arc among threads
pub trait MetricTrait: fmt::Debug + Default + Send + Sync {
    fn reset(&self);
}

/// BucketWrap represent a slot to record metrics
/// The metric itself should be atomic
/// The length of BucketWrap could be seen in LeapArray.
/// The scope of time is [start_stamp, start_stamp+bucket_length)
#[derive(Debug, Default)]
pub struct BucketWrap<T: MetricTrait> {
    // The start timestamp of this statistic bucket wrapper.
    start_stamp: AtomicU64,
    // The actual data structure to record the metrics (e.g. StatBucket).
    value: T,
}

impl<T: MetricTrait> BucketWrap<T> {
    pub fn new(start_stamp: u64) -> Self {
        BucketWrap {
            start_stamp: AtomicU64::new(start_stamp),
            value: T::default(),
        }
    }

    pub fn start_stamp(&self) -> u64 {
        self.start_stamp.load(Ordering::SeqCst)
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn reset_start_stamp(&self, start_stamp: u64) {
        self.start_stamp.store(start_stamp, Ordering::SeqCst);
    }

    pub fn reset_value(&self) {
        self.value.reset();
    }

    /// a bucket is deprecated once its start has rolled out of `[now - interval, now]`,
    /// buckets never written are always deprecated
    pub fn is_deprecated(&self, now: u64, interval: u64) -> bool {
        let start = self.start_stamp.load(Ordering::SeqCst);
        start == DEFAULT_TIME || (now > start && now - start > interval)
    }
}

/// The BucketWrap leap array,
/// it treats the inner array as a ring
/// sample_count represent the number of BucketWrap
/// interval_ms represent the interval of LeapArray.
/// The bucket length is `ceil(interval_ms / sample_count)`.
/// For example, interval_ms is 1000ms, sample_count is 5, so bucket_len_ms is 200ms.
/// Currently, the race condition resolving relies on inner atomatic metric, e.g., StatBucket
#[derive(Debug)]
pub struct LeapArray<T: MetricTrait> {
    bucket_len_ms: u64,
    sample_count: u32,
    interval_ms: u64,
    pub(crate) array: Vec<BucketWrap<T>>,
    // guards the lazy reset of deprecated buckets, one per bucket
    mutex: Vec<Mutex<()>>,
}

impl<T: MetricTrait> LeapArray<T> {
    pub fn new(sample_count: u32, interval_ms: u64) -> Result<Self> {
        if sample_count == 0 || interval_ms == 0 {
            return Err(Error::msg(
                "Invalid sample count or interval_ms, both of them should be positive",
            ));
        }
        let mut array = Vec::with_capacity(sample_count as usize);
        let mut mutex = Vec::with_capacity(sample_count as usize);
        for _ in 0..sample_count {
            array.push(BucketWrap::default());
            mutex.push(Mutex::new(()));
        }
        Ok(LeapArray {
            bucket_len_ms: div_ceil(interval_ms, sample_count as u64),
            sample_count,
            interval_ms,
            array,
            mutex,
        })
    }

    pub fn bucket_len_ms(&self) -> u64 {
        self.bucket_len_ms
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn reset_bucket(&self, idx: usize, start_stamp: u64) {
        // clear the value first, writers only use a bucket after seeing its new start stamp
        self.array[idx].reset_value();
        self.array[idx].reset_start_stamp(start_stamp);
    }

    pub fn get_bucket_of_time(&self, now: u64) -> Result<&BucketWrap<T>> {
        let idx = self.time2idx(now) as usize;
        let target_start = self.calculate_start_stamp(now);
        /*
        Get bucket item at given time from the array.
        - (1) Bucket is absent, then just take it over.
        - (2) Bucket is up-to-date, then just return the bucket.
        - (3) Bucket is deprecated, then reset it lazily, no separate clearing pass is needed.
        */
        let bucket = &self.array[idx];
        loop {
            let start = bucket.start_stamp();
            if start == target_start {
                /*
                    B0       B1      B2     B3      B4
                ||_______|_______|_______|_______|_______||___
                200     400     600     800     1000    1200  timestamp
                                            ^
                                         time=888
                           start of Bucket 3: 800, so it's up-to-date
                 */
                return Ok(bucket);
            } else if start == DEFAULT_TIME || target_start > start {
                /*
                  (old)
                            B0       B1      B2    NULL      B4
                |_______||_______|_______|_______|_______|_______||___
                ...    1200     1400    1600    1800    2000    2200  timestamp
                                             ^
                                          time=1676
                         start of Bucket 2: 400, deprecated, should be reset
                The reset is guarded by a tiny per-bucket lock,
                it only takes effect when the bucket rolls over.
                 */
                if let Ok(_guard) = self.mutex[idx].try_lock() {
                    if bucket.start_stamp() == start {
                        self.reset_bucket(idx, target_start);
                    }
                    return Ok(bucket);
                } else {
                    // another writer is resetting the bucket
                    std::thread::yield_now();
                }
            } else {
                return Err(Error::msg("invalid time stamp, cannot find bucket"));
            }
        }
    }

    /// compute the start timestamp of current bucket
    pub(crate) fn calculate_start_stamp(&self, now: u64) -> u64 {
        now - now % self.bucket_len_ms
    }

    pub(crate) fn time2idx(&self, now: u64) -> u64 {
        let idx = now / self.bucket_len_ms;
        idx % (self.sample_count as u64)
    }

    ///  Get all BucketWrap between [current time - leap array interval, current time]
    pub fn get_valid_values(&self, now: u64) -> Vec<&BucketWrap<T>> {
        self.array
            .iter()
            .filter(|bucket| !bucket.is_deprecated(now, self.interval_ms))
            .collect()
    }

    /// `reset` clears all the buckets
    pub fn reset(&self) {
        for (idx, bucket) in self.array.iter().enumerate() {
            let _guard = self.mutex[idx].lock().unwrap_or_else(|e| e.into_inner());
            bucket.reset_value();
            bucket.reset_start_stamp(DEFAULT_TIME);
        }
    }
}
