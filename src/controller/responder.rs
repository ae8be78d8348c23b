//! The idle-event gate and actuation path.
//!
//! [`IdleResponder`] is shared between the idle polling thread (which
//! raises idle events) and the controller (which owns monitoring state).
//! The guard check and set happen in one critical section so two idle
//! events can never both pass the gate.

use crate::controller::TrayUpdate;
use crate::mouse::{MouseMover, MovementObserver};
use crate::monitor::IdleHandler;
use crate::timer::OneShotTimer;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared monitoring state. The controller is the writer for the
/// monitoring and schedule flags; `is_moving` is owned by the actuation
/// path.
#[derive(Debug, Default)]
pub struct MonitorGate {
    pub monitoring_enabled: bool,
    pub within_schedule: bool,
    pub is_moving: bool,
}

/// Responds to idle events by nudging the mouse, subject to the gate.
pub struct IdleResponder {
    gate: Arc<Mutex<MonitorGate>>,
    mover: MouseMover,
    updates: Mutex<Sender<TrayUpdate>>,
    icon_decay_delay: Duration,
    icon_decay: Mutex<Option<OneShotTimer>>,
}

impl IdleResponder {
    pub fn new(
        gate: Arc<Mutex<MonitorGate>>,
        updates: Sender<TrayUpdate>,
        icon_decay_delay: Duration,
    ) -> Self {
        Self {
            gate,
            mover: MouseMover::new(),
            updates: Mutex::new(updates),
            icon_decay_delay,
            icon_decay: Mutex::new(None),
        }
    }

    /// Cancels a pending icon reset, joining its timer thread.
    pub fn cancel_icon_decay(&self) {
        let pending = self.icon_decay.lock().ok().and_then(|mut slot| slot.take());
        if let Some(timer) = pending {
            timer.cancel();
        }
    }

    fn send(&self, update: TrayUpdate) {
        if let Ok(tx) = self.updates.lock() {
            let _ = tx.send(update);
        }
    }

    fn clone_sender(&self) -> Option<Sender<TrayUpdate>> {
        self.updates.lock().ok().map(|tx| tx.clone())
    }
}

impl IdleHandler for IdleResponder {
    fn on_idle(&self) {
        // Check-and-set in one critical section: a second idle event
        // arriving while a nudge is in flight is dropped here.
        {
            let Ok(mut gate) = self.gate.lock() else {
                return;
            };
            if !gate.monitoring_enabled || !gate.within_schedule || gate.is_moving {
                return;
            }
            gate.is_moving = true;
        }

        let moved = self.mover.move_imperceptibly(self);
        if moved {
            tracing::debug!("Nudge delivered");
        }
    }
}

impl MovementObserver for IdleResponder {
    fn movement_started(&self) {
        self.send(TrayUpdate::Active(true));
    }

    fn movement_completed(&self) {
        // The logical gate clears immediately; only the tray icon keeps
        // its "active" tint a little longer.
        if let Ok(mut gate) = self.gate.lock() {
            gate.is_moving = false;
        }

        let Some(tx) = self.clone_sender() else {
            return;
        };
        let reset = OneShotTimer::schedule(self.icon_decay_delay, move || {
            let _ = tx.send(TrayUpdate::Active(false));
        });

        if let Ok(mut slot) = self.icon_decay.lock() {
            if let Some(previous) = slot.replace(reset) {
                previous.cancel();
            }
        }
    }
}
