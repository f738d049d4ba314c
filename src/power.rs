//! Power management module - timed halts for battery operation.
//!
//! nRF52840 power modes:
//! - System ON: Normal operation (~3.5 mA with BLE active)
//! - System ON Idle: CPU sleeping, peripherals active (~1.5 mA)
//! - System OFF: Deep sleep, wake on GPIO/RTC (~0.3 µA)
//!
//! System OFF has no timed wake-up, so a halt is:
//!   1. radio off (the BLE task drops its advertisement / connection),
//!   2. the [`RetainedImage`] written to `.uninit` RAM,
//!   3. System ON idle for the halt duration,
//!   4. a soft reset, which re-runs startup and restores the image.
//!
//! `.uninit` is not touched by the runtime's RAM init and the nRF52 keeps
//! RAM powered across a soft reset, so the image survives step 4.

use core::cell::RefCell;
use core::mem::MaybeUninit;
use core::ptr;

use cortex_m::peripheral::SCB;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};

use crate::clock::{PersistentClock, UptimeSource};
use crate::power_logic::{ActivitySleepScheduler, SharedScheduler};
use crate::storage::{Restored, RetainedImage};

/// Halt requested from outside the control loop (disconnect policy B).
pub static HALT_REQUEST: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Raised right before a halt; the BLE task stops everything on it.
pub static RADIO_OFF: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[link_section = ".uninit.RETAINED"]
static mut RETAINED: MaybeUninit<RetainedImage> = MaybeUninit::uninit();

/// Seconds since this boot, from the embassy time driver (RTC1).
pub struct Uptime;

impl UptimeSource for Uptime {
    fn uptime_secs(&self) -> u64 {
        Instant::now().as_secs()
    }
}

pub type NodeClock = PersistentClock<Uptime>;
pub type NodeScheduler = ActivitySleepScheduler<NodeClock>;

/// The scheduler as shared by the control loop and the BLE task.
pub type SchedulerCell = Mutex<CriticalSectionRawMutex, RefCell<NodeScheduler>>;

impl SharedScheduler for SchedulerCell {
    type Clock = NodeClock;

    fn with<R>(&self, f: impl FnOnce(&mut NodeScheduler) -> R) -> R {
        self.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Take the image left by the last halt, if any.
///
/// The slot is blanked afterwards so a crash reset boots clean.
/// Call once, before any task is spawned.
pub fn take_retained() -> Option<Restored> {
    // SAFETY: single-threaded startup; every bit pattern is a valid
    // `RetainedImage` and `restore()` rejects the ones we did not write.
    let image = unsafe { ptr::read_volatile(ptr::addr_of!(RETAINED).cast::<RetainedImage>()) };
    store_retained(RetainedImage::blank());
    image.restore()
}

fn store_retained(image: RetainedImage) {
    // SAFETY: only the control loop writes after startup, and it resets
    // right after.
    unsafe { ptr::write_volatile(ptr::addr_of_mut!(RETAINED).cast::<RetainedImage>(), image) }
}

/// Ask the control loop to halt for `secs` on its next tick.
pub fn request_halt(secs: u32) {
    HALT_REQUEST.signal(secs);
}

/// Halt for `secs`, then restart from `image`.
pub async fn halt(secs: u32, image: RetainedImage) -> ! {
    RADIO_OFF.signal(());
    store_retained(image);
    info!("Power: halt {}s", secs);
    Timer::after(Duration::from_secs(u64::from(secs))).await;
    SCB::sys_reset()
}

/// Restart now, forgetting the retained state (button C).
pub fn hard_reset() -> ! {
    warn!("Power: hard reset");
    store_retained(RetainedImage::blank());
    SCB::sys_reset()
}
