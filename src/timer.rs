//! Cancellable timers for the control loop.
//!
//! Plain-thread timers with condvar-backed cancellation so that stopping a
//! timer wakes it immediately and joins the worker before returning. The
//! periodic timer is a recurring one-shot: each interval is measured after
//! the previous callback finishes, so the cadence drifts by the callback's
//! own run time.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One-way stop flag that sleeping workers can wait on.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal and wakes all waiters.
    pub fn set(&self) {
        if let Ok(mut stopped) = self.stopped.lock() {
            *stopped = true;
        }
        self.condvar.notify_all();
    }

    pub fn is_set(&self) -> bool {
        self.stopped.lock().map(|s| *s).unwrap_or(true)
    }

    /// Sleeps for up to `timeout`, waking early if the signal is raised.
    /// Returns true when the signal is set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Ok(guard) = self.stopped.lock() else {
            return true;
        };
        match self
            .condvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
        {
            Ok((stopped, _)) => *stopped,
            Err(_) => true,
        }
    }
}

/// Runs a callback once after a delay unless cancelled first.
///
/// Dropping the timer cancels it and joins the worker thread, so a pending
/// callback can never fire after the owner is gone.
#[derive(Debug)]
pub struct OneShotTimer {
    stop: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl OneShotTimer {
    pub fn schedule<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let stop = Arc::new(StopSignal::new());
        let worker_stop = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            if !worker_stop.wait_timeout(delay) {
                callback();
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Cancels the timer, joining the worker. A timer whose callback has
    /// already run is simply joined.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.stop.set();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Invokes a callback every `interval` until cancelled.
#[derive(Debug)]
pub struct PeriodicTimer {
    stop: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTimer {
    pub fn spawn<F>(name: &str, interval: Duration, callback: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let stop = Arc::new(StopSignal::new());
        let worker_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while !worker_stop.wait_timeout(interval) {
                    callback();
                }
            })
            .ok();

        if handle.is_none() {
            tracing::error!(name, "Failed to spawn timer thread");
        }

        Self { stop, handle }
    }

    /// Cancels the timer, joining the worker.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop.set();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
