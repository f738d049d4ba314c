//! Seconds-resolution clock that keeps counting across halts.
//!
//! The MCU's own timer restarts from zero on every wake, so
//! [`PersistentClock`] adds a base carried over in the retained arena.
//! Before halting, the firmware stores `now + halt_secs` as the next base.

use core::cell::Cell;

/// Seconds since an arbitrary fixed epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// `self + secs`, saturating at the end of time.
    pub const fn after(self, secs: u32) -> Self {
        Self(self.0.saturating_add(secs as u64))
    }
}

/// Source of "now".
pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Monotonic time since the current wake (the hardware timer).
pub trait UptimeSource {
    fn uptime_secs(&self) -> u64;
}

impl<U: UptimeSource + ?Sized> UptimeSource for &U {
    fn uptime_secs(&self) -> u64 {
        (**self).uptime_secs()
    }
}

/// Clock continuing from a base that survives halts.
pub struct PersistentClock<U> {
    base: Timestamp,
    uptime: U,
}

impl<U: UptimeSource> PersistentClock<U> {
    /// `base` is the value restored from the retained arena (zero after
    /// power loss).
    pub fn new(base: Timestamp, uptime: U) -> Self {
        Self { base, uptime }
    }
}

impl<U: UptimeSource> Clock for PersistentClock<U> {
    fn now(&self) -> Timestamp {
        Timestamp(self.base.0.saturating_add(self.uptime.uptime_secs()))
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, secs: u64) {
        self.now.set(secs);
    }

    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get().saturating_add(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }
}

impl UptimeSource for ManualClock {
    fn uptime_secs(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistent_clock_adds_restored_base() {
        let uptime = ManualClock::new(0);
        let clock = PersistentClock::new(Timestamp(100), &uptime);
        assert_eq!(clock.now(), Timestamp(100));

        uptime.advance(7);
        assert_eq!(clock.now(), Timestamp(107));
    }

    #[test]
    fn timestamp_after_saturates() {
        assert_eq!(Timestamp(u64::MAX - 1).after(5), Timestamp(u64::MAX));
        assert_eq!(Timestamp(10).after(8), Timestamp(18));
    }
}
