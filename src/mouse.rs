//! Imperceptible mouse actuation.
//!
//! A nudge is a one-pixel relative displacement followed, after a short
//! settle delay, by the reverse displacement. That is enough to reset the
//! system idle timer without visibly disturbing the cursor.

use crate::platform;
use std::time::Duration;

/// Receives movement lifecycle notifications.
pub trait MovementObserver: Send + Sync {
    fn movement_started(&self);
    fn movement_completed(&self);
}

/// Fires `movement_completed` when dropped, so completion is reported on
/// every exit path of an actuation.
struct CompletionGuard<'a>(&'a dyn MovementObserver);

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.0.movement_completed();
    }
}

/// Performs imperceptible cursor nudges.
#[derive(Debug, Clone)]
pub struct MouseMover {
    /// Displacement magnitude in pixels.
    distance: i32,
    /// Pause between the out and back displacements.
    settle: Duration,
}

impl MouseMover {
    pub fn new() -> Self {
        Self {
            distance: 1,
            settle: Duration::from_millis(50),
        }
    }

    /// Moves the cursor out one pixel and back.
    ///
    /// `movement_started` is notified first; `movement_completed` is
    /// notified unconditionally when the attempt finishes, whether or not
    /// the injections succeeded. Returns true only when both displacements
    /// were accepted by the OS.
    pub fn move_imperceptibly(&self, observer: &dyn MovementObserver) -> bool {
        observer.movement_started();
        let _completion = CompletionGuard(observer);

        let out = platform::send_relative_motion(self.distance, 0);
        std::thread::sleep(self.settle);
        let back = platform::send_relative_motion(-self.distance, 0);

        if !(out && back) {
            tracing::warn!(out, back, "Mouse nudge injection failed");
        }

        out && back
    }
}

impl Default for MouseMover {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        started: AtomicU32,
        completed: AtomicU32,
    }

    impl MovementObserver for CountingObserver {
        fn movement_started(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn movement_completed(&self) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_completion_reported_even_on_injection_failure() {
        let observer = CountingObserver::default();
        // On hosts without input injection the displacements fail; the
        // observer contract must hold regardless.
        let _ = MouseMover::new().move_imperceptibly(&observer);

        assert_eq!(observer.started.load(Ordering::SeqCst), 1);
        assert_eq!(observer.completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_started_precedes_completed() {
        struct OrderObserver {
            started_first: AtomicU32,
        }

        impl MovementObserver for OrderObserver {
            fn movement_started(&self) {
                self.started_first.fetch_add(1, Ordering::SeqCst);
            }

            fn movement_completed(&self) {
                assert!(self.started_first.load(Ordering::SeqCst) > 0);
            }
        }

        let observer = OrderObserver {
            started_first: AtomicU32::new(0),
        };
        let _ = MouseMover::new().move_imperceptibly(&observer);
    }
}
