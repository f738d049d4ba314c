//! Activity-driven duty-cycle scheduler.
//!
//! Owns the [`PersistentState`] and decides, once per control-loop tick,
//! whether the node may halt. Activity (connect, read, duty-cycle toggle)
//! re-anchors the sleep deadline to `now + extension`; a later call with
//! a shorter extension moves the deadline back in.
//!
//! Two states:
//!   - Awake    - control loop ticks, `evaluate()` returns `Continue`.
//!   - Sleeping - entered only when the caller acts on `EnterSleep`.
//!                Resume re-runs startup, restores the state, and the
//!                next tick carries on as if nothing happened.

use core::cell::RefCell;

use crate::clock::{Clock, Timestamp};
use crate::config::NodeConfig;
use crate::storage::{PersistentState, RetainedImage};

/// Outcome of one [`ActivitySleepScheduler::evaluate`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decision {
    /// Keep ticking.
    Continue,
    /// Halt for this many seconds.
    EnterSleep(u32),
}

/// The duty-cycle state machine.
pub struct ActivitySleepScheduler<C> {
    clock: C,
    state: PersistentState,
    config: NodeConfig,
}

impl<C: Clock> ActivitySleepScheduler<C> {
    /// Resume from `state` (restored or zeroed).
    pub fn new(clock: C, state: PersistentState, config: NodeConfig) -> Self {
        Self {
            clock,
            state,
            config,
        }
    }

    /// End-of-setup extension, so a fresh wake gets its awake window.
    pub fn boot(&mut self) {
        self.record_activity(self.config.awake_secs);
        info!(
            "Power: boot duty_cycle={} deadline={}",
            self.state.duty_cycle_enabled,
            self.state.sleep_deadline.as_secs()
        );
    }

    /// Push the deadline to `now + extension_secs`.
    pub fn record_activity(&mut self, extension_secs: u32) {
        self.state.sleep_deadline = self.clock.now().after(extension_secs);
        trace!("Power: deadline -> {}", self.state.sleep_deadline.as_secs());
    }

    pub fn set_duty_cycle(&mut self, enabled: bool) {
        self.state.duty_cycle_enabled = enabled;
        info!("Power: duty_cycle={}", enabled);
        self.record_activity(self.config.awake_secs);
    }

    /// Flip duty cycling; returns the new setting.
    pub fn toggle_duty_cycle(&mut self) -> bool {
        let enabled = !self.state.duty_cycle_enabled;
        self.set_duty_cycle(enabled);
        enabled
    }

    /// Sample the clock and decide. Only `now` is written.
    pub fn evaluate(&mut self) -> Decision {
        self.state.now = self.clock.now();
        if self.state.duty_cycle_enabled && self.state.now > self.state.sleep_deadline {
            Decision::EnterSleep(self.config.sleep_secs)
        } else {
            Decision::Continue
        }
    }

    /// Image to write to retained RAM before halting for `secs`. The state
    /// is sealed as is; the clock resumes at `now + secs`.
    pub fn halt_for(&self, secs: u32) -> RetainedImage {
        let now = self.clock.now();
        debug!("Power: halting {}s at {}", secs, now.as_secs());
        RetainedImage::seal(&self.state, now.after(secs))
    }

    /// Latest reading, kept so it survives the halt.
    pub fn remember_value(&mut self, value: i8) {
        self.state.last_value = value;
    }

    pub fn state(&self) -> PersistentState {
        self.state
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn duty_cycle_enabled(&self) -> bool {
        self.state.duty_cycle_enabled
    }
}

/// Access to a scheduler shared between the control loop and the BLE task.
///
/// Each call runs `f` with exclusive access, so an event handler cannot
/// observe a half-applied update.
pub trait SharedScheduler {
    type Clock: Clock;

    fn with<R>(&self, f: impl FnOnce(&mut ActivitySleepScheduler<Self::Clock>) -> R) -> R;
}

/// Single-context sharing (host tools, tests).
impl<C: Clock> SharedScheduler for RefCell<ActivitySleepScheduler<C>> {
    type Clock = C;

    fn with<R>(&self, f: impl FnOnce(&mut ActivitySleepScheduler<C>) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}
