//! Test-only library interface for tempnode.
//!
//! This module re-exports the pure logic modules that can be tested
//! on the host (no embedded hardware required): the duty-cycle
//! scheduler, the retained-state image, the clock, the value provider,
//! the BLE event adapter and the input/console logic.
//!
//! Usage: `cargo test --lib` or `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].
//! This lib.rs provides a separate entry point for host-based testing.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod power_logic;
pub mod sensor;
pub mod storage;

// Internal module paths for the actual implementations
#[path = "ble/adv_data.rs"]
mod ble_adv_data_impl;
#[path = "ble/events.rs"]
mod ble_events_impl;

#[path = "ui/console.rs"]
mod ui_console_impl;
#[path = "ui/input_logic.rs"]
mod ui_input_logic_impl;

pub mod ble {
    pub mod adv_data {
        pub use crate::ble_adv_data_impl::*;
    }
    pub mod events {
        pub use crate::ble_events_impl::*;
    }

    pub use events::{DisconnectAction, PeripheralEventAdapter, PeripheralEvents};
}

pub mod ui {
    pub mod console {
        pub use crate::ui_console_impl::*;
    }
    pub mod input_logic {
        pub use crate::ui_input_logic_impl::*;
    }

    pub use input_logic::{Button, Command, InputDispatcher};
}

pub use clock::{Clock, ManualClock, PersistentClock, Timestamp};
pub use config::NodeConfig;
pub use power_logic::{ActivitySleepScheduler, Decision, SharedScheduler};
pub use storage::{PersistentState, RetainedImage};

// ═══════════════════════════════════════════════════════════════════════════
// Cross-module tests - halt/resume cycles through the retained image
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DebugLevel, DisconnectPolicy};

    const CONFIG: NodeConfig = NodeConfig {
        awake_secs: 2,
        sleep_secs: 2,
        activity_timeout_secs: 8,
        reset_halt_secs: 1,
        disconnect_policy: DisconnectPolicy::ResumeAdvertising,
        debug_level: DebugLevel::Off,
    };

    /// Startup as the firmware does it: restore or zero, then boot.
    fn wake<'a>(
        image: &RetainedImage,
        uptime: &'a ManualClock,
    ) -> ActivitySleepScheduler<PersistentClock<&'a ManualClock>> {
        let restored = image.restore();
        let base = restored.map(|r| r.clock_base).unwrap_or(Timestamp::ZERO);
        let state = restored.map(|r| r.state).unwrap_or_else(PersistentState::zeroed);
        let mut scheduler =
            ActivitySleepScheduler::new(PersistentClock::new(base, uptime), state, CONFIG);
        scheduler.boot();
        scheduler
    }

    #[test]
    fn halt_resume_keeps_state_bit_identical() {
        let uptime = ManualClock::new(0);
        let mut scheduler = wake(&RetainedImage::blank(), &uptime);
        scheduler.set_duty_cycle(true);
        scheduler.remember_value(17);
        uptime.set(5);
        let before = scheduler.state();

        let image = scheduler.halt_for(2);
        let restored = image.restore().unwrap();
        assert_eq!(restored.state.to_bytes(), before.to_bytes());
        assert_eq!(restored.clock_base, Timestamp(7));
    }

    #[test]
    fn time_keeps_moving_forward_across_halts() {
        let uptime = ManualClock::new(0);
        let mut image = RetainedImage::blank();
        let mut last_now = Timestamp::ZERO;

        for _ in 0..4 {
            uptime.set(0);
            let mut scheduler = wake(&image, &uptime);
            scheduler.set_duty_cycle(true);

            let secs = loop {
                uptime.advance(1);
                let now = scheduler.now();
                assert!(now >= last_now);
                last_now = now;
                if let Decision::EnterSleep(secs) = scheduler.evaluate() {
                    break secs;
                }
            };
            image = scheduler.halt_for(secs);
        }
        assert!(last_now.as_secs() >= 4 * 3);
    }

    #[test]
    fn resumed_duty_cycle_survives_wake() {
        let uptime = ManualClock::new(0);
        let mut scheduler = wake(&RetainedImage::blank(), &uptime);
        assert!(!scheduler.duty_cycle_enabled());
        scheduler.toggle_duty_cycle();
        let image = scheduler.halt_for(2);

        uptime.set(0);
        let resumed = wake(&image, &uptime);
        assert!(resumed.duty_cycle_enabled());
        assert_eq!(resumed.now(), Timestamp(2));
        assert_eq!(resumed.state().sleep_deadline, Timestamp(4));
    }

    #[test]
    fn corrupted_image_boots_with_duty_cycle_off() {
        let uptime = ManualClock::new(0);
        let mut scheduler = wake(&RetainedImage::blank(), &uptime);
        scheduler.set_duty_cycle(true);
        let mut image = scheduler.halt_for(2);
        image.invalidate();

        let resumed = wake(&image, &uptime);
        assert!(!resumed.duty_cycle_enabled());
        assert_eq!(resumed.now(), Timestamp(0));
    }
}
