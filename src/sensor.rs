//! Temperature value provider.
//!
//! Any reading counts as activity: the node must stay up long enough to
//! finish the GATT transaction that asked for it.
//!
//! Payload (Temperature, 0x2A6E):
//! ```text
//! Byte 0..2: sint16 little-endian, 0.01 °C units
//! ```

use rand::{Rng, RngCore};

use crate::clock::Clock;
use crate::config::{TEMP_MAX_C, TEMP_MIN_C};
use crate::power_logic::ActivitySleepScheduler;

/// Temperature payload size in bytes.
pub const TEMPERATURE_PAYLOAD_SIZE: usize = 2;

/// Something that yields whole-degree readings.
pub trait TemperatureSource {
    fn sample(&mut self) -> i8;
}

/// Placeholder source: uniform over the declared bounds.
pub struct RandomTemperature<R> {
    rng: R,
}

impl<R: RngCore> RandomTemperature<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> TemperatureSource for RandomTemperature<R> {
    fn sample(&mut self) -> i8 {
        self.rng.random_range(TEMP_MIN_C..=TEMP_MAX_C)
    }
}

/// Produces the next reported value and records it as activity.
pub struct SensorValueProvider<S> {
    source: S,
    activity_timeout_secs: u32,
}

impl<S: TemperatureSource> SensorValueProvider<S> {
    pub fn new(source: S, activity_timeout_secs: u32) -> Self {
        Self {
            source,
            activity_timeout_secs,
        }
    }

    /// Sample, clamp into bounds, store as the last value, extend the
    /// deadline.
    pub fn produce<C: Clock>(&mut self, scheduler: &mut ActivitySleepScheduler<C>) -> i8 {
        let value = clamp_reading(self.source.sample());
        scheduler.remember_value(value);
        scheduler.record_activity(self.activity_timeout_secs);
        debug!("Sensor: {} C", value);
        value
    }
}

/// Force a raw reading into `[TEMP_MIN_C, TEMP_MAX_C]`.
pub fn clamp_reading(raw: i8) -> i8 {
    raw.clamp(TEMP_MIN_C, TEMP_MAX_C)
}

/// Encode whole degrees as a Temperature characteristic value.
pub fn encode_temperature(celsius: i8) -> [u8; TEMPERATURE_PAYLOAD_SIZE] {
    (celsius as i16 * 100).to_le_bytes()
}

/// Inverse of [`encode_temperature`], rounding toward zero.
pub fn decode_temperature(data: &[u8]) -> Option<i16> {
    if data.len() < TEMPERATURE_PAYLOAD_SIZE {
        return None;
    }
    Some(i16::from_le_bytes([data[0], data[1]]) / 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, Timestamp};
    use crate::config::NodeConfig;
    use crate::storage::PersistentState;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    struct Fixed(i8);

    impl TemperatureSource for Fixed {
        fn sample(&mut self) -> i8 {
            self.0
        }
    }

    #[test]
    fn random_source_stays_in_bounds() {
        let mut source = RandomTemperature::new(SmallRng::seed_from_u64(7));
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..5_000 {
            let v = source.sample();
            assert!((TEMP_MIN_C..=TEMP_MAX_C).contains(&v), "{}", v);
            seen_min |= v == TEMP_MIN_C;
            seen_max |= v == TEMP_MAX_C;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn produce_clamps_and_extends() {
        let clock = ManualClock::new(20);
        let mut scheduler =
            ActivitySleepScheduler::new(&clock, PersistentState::zeroed(), NodeConfig::DEFAULT);
        let mut provider = SensorValueProvider::new(Fixed(99), 8);

        assert_eq!(provider.produce(&mut scheduler), TEMP_MAX_C);
        assert_eq!(scheduler.state().last_value, TEMP_MAX_C);
        assert_eq!(scheduler.state().sleep_deadline, Timestamp(28));
    }

    #[test]
    fn encode_uses_hundredths_little_endian() {
        assert_eq!(encode_temperature(21), [0x34, 0x08]); // 2100
        assert_eq!(encode_temperature(-10), [0x18, 0xFC]); // -1000
        assert_eq!(encode_temperature(0), [0x00, 0x00]);
    }

    #[test]
    fn decode_short_payload_fails() {
        assert_eq!(decode_temperature(&[0x34]), None);
        assert_eq!(decode_temperature(&[0x34, 0x08]), Some(21));
    }
}
