use crate::{logging, utils, Result};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// `Tick` is the periodic work driven by the `Scheduler`.
pub trait Tick: Send + Sync + 'static {
    /// the period before the next tick, read again after every tick
    fn period_ms(&self) -> u64;
    fn tick(&self, now: u64);
}

/// `Scheduler` runs a `Tick` on a background thread until stopped,
/// or until its target is dropped.
#[derive(Debug)]
pub struct Scheduler {
    stop: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn start<T: Tick>(name: &str, target: Weak<T>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || loop {
            let period = match target.upgrade() {
                Some(target) => target.period_ms(),
                None => break,
            };
            match rx.recv_timeout(Duration::from_millis(period)) {
                Err(RecvTimeoutError::Timeout) => {}
                // stopped
                Ok(_) | Err(RecvTimeoutError::Disconnected) => break,
            }
            match target.upgrade() {
                Some(target) => target.tick(utils::curr_time_millis()),
                None => break,
            }
        })?;
        logging::info!("[CircuitBreaker Scheduler] Scheduler {} started", name);
        Ok(Scheduler {
            stop: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// `stop` wakes the background thread up and waits for it to exit, it is idempotent.
    pub fn stop(&self) {
        if let Some(tx) = self.stop.lock().unwrap().take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                logging::error!("[CircuitBreaker Scheduler] The scheduler thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().unwrap().is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter {
        ticks: AtomicU64,
    }

    impl Tick for Counter {
        fn period_ms(&self) -> u64 {
            10
        }

        fn tick(&self, _now: u64) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn tick_until_stopped() {
        let counter = Arc::new(Counter::default());
        let scheduler = Scheduler::start("test-scheduler", Arc::downgrade(&counter)).unwrap();
        assert!(scheduler.is_running());
        utils::sleep_for_ms(200);
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());
        let ticks = counter.ticks.load(Ordering::SeqCst);
        assert!(ticks > 0);
        utils::sleep_for_ms(50);
        assert_eq!(counter.ticks.load(Ordering::SeqCst), ticks);
    }

    #[test]
    fn exits_when_target_dropped() {
        let counter = Arc::new(Counter::default());
        let scheduler = Scheduler::start("test-scheduler", Arc::downgrade(&counter)).unwrap();
        drop(counter);
        // joins a thread that has already exited
        scheduler.stop();
        assert!(!scheduler.is_running());
    }
}
