//! State that survives a low-power halt.
//!
//! The halt ends in a soft reset, which leaves RAM contents alone but
//! re-runs startup. [`RetainedImage`] is the block the firmware keeps in a
//! `.uninit` section across that reset:
//!
//! ```text
//! magic       u32   RETAINED_MAGIC while the image is valid
//! state       [u8; 18]
//!             0..8   now             (u64 LE, seconds)
//!             8..16  sleep_deadline  (u64 LE, seconds)
//!             16     duty_cycle      (0 / 1)
//!             17     last_value      (i8)
//! clock_base  u64   seconds the clock resumes from
//! check       u32   FNV-1a over magic, state and clock_base
//! ```
//!
//! Survives halt, does not survive power loss. After power loss the
//! block is garbage; `restore()` rejects it and the node boots from the
//! all-zero state (duty cycling off).

use crate::clock::Timestamp;
use crate::config::{TEMP_MAX_C, TEMP_MIN_C};

/// Marks an image written by this firmware.
pub const RETAINED_MAGIC: u32 = 0x5445_4D50; // "TEMP"

/// Serialized [`PersistentState`] size in bytes.
pub const STATE_IMAGE_SIZE: usize = 18;

/// The four scalars the scheduler needs after a wake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(C)]
pub struct PersistentState {
    /// Last sampled clock time.
    pub now: Timestamp,
    /// Earliest time the node may halt.
    pub sleep_deadline: Timestamp,
    /// Whether the scheduler may ask for a halt at all.
    pub duty_cycle_enabled: bool,
    /// Last reported temperature (°C).
    pub last_value: i8,
}

/// Why a serialized image was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Fewer than [`STATE_IMAGE_SIZE`] bytes.
    Truncated,
    /// Duty-cycle byte other than 0 or 1.
    BadFlag(u8),
    /// Stored reading outside the sensor bounds.
    ValueOutOfRange(i8),
}

impl PersistentState {
    /// Fresh boot: everything zero, duty cycling off.
    pub const fn zeroed() -> Self {
        Self {
            now: Timestamp::ZERO,
            sleep_deadline: Timestamp::ZERO,
            duty_cycle_enabled: false,
            last_value: 0,
        }
    }

    /// Serialise into the fixed little-endian layout.
    pub fn to_bytes(&self) -> [u8; STATE_IMAGE_SIZE] {
        let mut buf = [0u8; STATE_IMAGE_SIZE];
        buf[0..8].copy_from_slice(&self.now.0.to_le_bytes());
        buf[8..16].copy_from_slice(&self.sleep_deadline.0.to_le_bytes());
        buf[16] = self.duty_cycle_enabled as u8;
        buf[17] = self.last_value as u8;
        buf
    }

    /// Parse the layout written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < STATE_IMAGE_SIZE {
            return Err(DecodeError::Truncated);
        }

        let duty_cycle_enabled = match data[16] {
            0 => false,
            1 => true,
            other => return Err(DecodeError::BadFlag(other)),
        };

        let last_value = data[17] as i8;
        if !(TEMP_MIN_C..=TEMP_MAX_C).contains(&last_value) {
            return Err(DecodeError::ValueOutOfRange(last_value));
        }

        Ok(Self {
            now: Timestamp(read_u64(&data[0..8])),
            sleep_deadline: Timestamp(read_u64(&data[8..16])),
            duty_cycle_enabled,
            last_value,
        })
    }
}

/// Contents of a valid retained image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Restored {
    pub state: PersistentState,
    pub clock_base: Timestamp,
}

/// The halt-surviving block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct RetainedImage {
    magic: u32,
    state: [u8; STATE_IMAGE_SIZE],
    clock_base: u64,
    check: u32,
}

impl RetainedImage {
    /// An image that never restores.
    pub const fn blank() -> Self {
        Self {
            magic: 0,
            state: [0; STATE_IMAGE_SIZE],
            clock_base: 0,
            check: 0,
        }
    }

    /// Build a valid image for `state`, resuming the clock at `clock_base`.
    pub fn seal(state: &PersistentState, clock_base: Timestamp) -> Self {
        let mut image = Self {
            magic: RETAINED_MAGIC,
            state: state.to_bytes(),
            clock_base: clock_base.0,
            check: 0,
        };
        image.check = image.digest();
        image
    }

    /// Recover the sealed contents, or `None` if the block was never
    /// written, was invalidated, or lost power.
    pub fn restore(&self) -> Option<Restored> {
        if self.magic != RETAINED_MAGIC || self.check != self.digest() {
            return None;
        }
        let state = PersistentState::from_bytes(&self.state).ok()?;
        Some(Restored {
            state,
            clock_base: Timestamp(self.clock_base),
        })
    }

    /// Make the next [`restore`](Self::restore) fail.
    pub fn invalidate(&mut self) {
        self.magic = 0;
    }

    pub fn is_valid(&self) -> bool {
        self.restore().is_some()
    }

    fn digest(&self) -> u32 {
        let mut hash = Fnv1a::new();
        hash.write(&self.magic.to_le_bytes());
        hash.write(&self.state);
        hash.write(&self.clock_base.to_le_bytes());
        hash.finish()
    }
}

impl Default for RetainedImage {
    fn default() -> Self {
        Self::blank()
    }
}

struct Fnv1a(u32);

impl Fnv1a {
    const OFFSET: u32 = 0x811C_9DC5;
    const PRIME: u32 = 0x0100_0193;

    fn new() -> Self {
        Self(Self::OFFSET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u32;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn finish(&self) -> u32 {
        self.0
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}
