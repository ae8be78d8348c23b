//! The idle polling worker.

use crate::platform;
use crate::timer::StopSignal;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

/// How often the worker samples idle time.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long `stop()` waits for the worker to wind down.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("idle threshold must be positive, got {0}")]
    InvalidThreshold(u32),
}

/// Invoked synchronously from the polling thread on every sample where the
/// elapsed idle time has reached the threshold.
pub trait IdleHandler: Send + Sync {
    fn on_idle(&self);
}

/// Source of the current idle time in seconds. Swappable for tests.
pub type IdleSource = Arc<dyn Fn() -> f64 + Send + Sync>;

struct Worker {
    stop: Arc<StopSignal>,
    done_rx: Receiver<()>,
    handle: JoinHandle<()>,
}

/// Polls idle time on a background thread and invokes an [`IdleHandler`]
/// when the threshold is exceeded.
///
/// `start()` and `stop()` are idempotent. Stopping waits (bounded) for the
/// worker to exit, so no idle event is delivered after `stop()` returns.
pub struct IdleMonitor {
    threshold_secs: Arc<AtomicU32>,
    handler: Arc<dyn IdleHandler>,
    source: IdleSource,
    poll_interval: Duration,
    worker: Option<Worker>,
}

impl IdleMonitor {
    pub fn new(threshold_secs: u32, handler: Arc<dyn IdleHandler>) -> Self {
        Self {
            threshold_secs: Arc::new(AtomicU32::new(threshold_secs)),
            handler,
            source: Arc::new(platform::idle_seconds),
            poll_interval: POLL_INTERVAL,
            worker: None,
        }
    }

    /// Replaces the idle-time source. Used by tests to simulate activity.
    pub fn with_idle_source(mut self, source: IdleSource) -> Self {
        self.source = source;
        self
    }

    /// Shortens the polling cadence. Used by tests.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Updates the idle threshold; takes effect on the next poll.
    pub fn set_threshold(&self, seconds: u32) -> Result<(), MonitorError> {
        if seconds == 0 {
            return Err(MonitorError::InvalidThreshold(seconds));
        }
        self.threshold_secs.store(seconds, Ordering::SeqCst);
        Ok(())
    }

    pub fn threshold_secs(&self) -> u32 {
        self.threshold_secs.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Current idle time in seconds; 0.0 when the platform query fails.
    pub fn idle_seconds(&self) -> f64 {
        (self.source)().max(0.0)
    }

    /// Starts the polling thread. No-op when already running.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }

        let stop = Arc::new(StopSignal::new());
        let (done_tx, done_rx) = mpsc::channel();

        let worker_stop = Arc::clone(&stop);
        let threshold = Arc::clone(&self.threshold_secs);
        let handler = Arc::clone(&self.handler);
        let source = Arc::clone(&self.source);
        let interval = self.poll_interval;

        let spawned = thread::Builder::new()
            .name("idle-poller".to_string())
            .spawn(move || {
                tracing::info!(
                    interval_ms = interval.as_millis(),
                    "Idle polling thread started"
                );

                loop {
                    if worker_stop.is_set() {
                        break;
                    }

                    let idle = source().max(0.0);
                    if idle >= threshold.load(Ordering::SeqCst) as f64 {
                        handler.on_idle();
                    }

                    if worker_stop.wait_timeout(interval) {
                        break;
                    }
                }

                tracing::info!("Idle polling thread shutting down");
                let _ = done_tx.send(());
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker {
                    stop,
                    done_rx,
                    handle,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to spawn idle polling thread");
            }
        }
    }

    /// Stops the polling thread, waiting up to two seconds for it to exit
    /// cleanly. Idempotent.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        worker.stop.set();
        match worker.done_rx.recv_timeout(STOP_TIMEOUT) {
            Ok(()) => {
                let _ = worker.handle.join();
            }
            Err(_) => {
                tracing::warn!("Idle polling thread did not stop within the timeout");
            }
        }
    }
}

impl Drop for IdleMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct CountingHandler(AtomicU32);

    impl IdleHandler for CountingHandler {
        fn on_idle(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting() -> Arc<CountingHandler> {
        Arc::new(CountingHandler(AtomicU32::new(0)))
    }

    #[test]
    fn test_set_threshold_rejects_zero() {
        let monitor = IdleMonitor::new(300, counting());
        assert!(matches!(
            monitor.set_threshold(0),
            Err(MonitorError::InvalidThreshold(0))
        ));
        assert_eq!(monitor.threshold_secs(), 300);
    }

    #[test]
    fn test_set_threshold_updates_value() {
        let monitor = IdleMonitor::new(300, counting());
        monitor.set_threshold(60).unwrap();
        assert_eq!(monitor.threshold_secs(), 60);
    }

    #[test]
    fn test_idle_event_fires_when_threshold_reached() {
        let handler = counting();
        let mut monitor = IdleMonitor::new(5, Arc::clone(&handler) as Arc<dyn IdleHandler>)
            .with_idle_source(Arc::new(|| 10.0))
            .with_poll_interval(Duration::from_millis(5));

        monitor.start();
        thread::sleep(Duration::from_millis(60));
        monitor.stop();

        assert!(handler.0.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_no_idle_event_below_threshold() {
        let handler = counting();
        let mut monitor = IdleMonitor::new(5, Arc::clone(&handler) as Arc<dyn IdleHandler>)
            .with_idle_source(Arc::new(|| 1.0))
            .with_poll_interval(Duration::from_millis(5));

        monitor.start();
        thread::sleep(Duration::from_millis(50));
        monitor.stop();

        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_event_after_stop_returns() {
        let handler = counting();
        let mut monitor = IdleMonitor::new(5, Arc::clone(&handler) as Arc<dyn IdleHandler>)
            .with_idle_source(Arc::new(|| 10.0))
            .with_poll_interval(Duration::from_millis(5));

        monitor.start();
        thread::sleep(Duration::from_millis(30));
        monitor.stop();

        let after_stop = handler.0.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(handler.0.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut monitor = IdleMonitor::new(300, counting())
            .with_idle_source(Arc::new(|| 0.0))
            .with_poll_interval(Duration::from_millis(5));

        monitor.start();
        assert!(monitor.is_running());
        monitor.start();
        assert!(monitor.is_running());

        monitor.stop();
        assert!(!monitor.is_running());
        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_negative_idle_time_clamped() {
        let monitor =
            IdleMonitor::new(300, counting()).with_idle_source(Arc::new(|| -3.0));
        assert_eq!(monitor.idle_seconds(), 0.0);
    }
}
