//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place. The two
//! behavioural axes (disconnect policy, console verbosity) are selected
//! with cargo features and folded into [`NodeConfig::DEFAULT`].

// Duty cycling

/// Seconds the node stays awake after boot or a duty-cycle toggle.
pub const AWAKE_SECONDS: u32 = 2;

/// Seconds of each low-power halt.
pub const SLEEP_SECONDS: u32 = 2;

/// Seconds of wake time granted by BLE activity (connect, read).
pub const ACTIVITY_TIMEOUT_SECONDS: u32 = 8;

/// Length of the radio-reset halt used by [`DisconnectPolicy::ResetRadio`].
pub const RESET_HALT_SECS: u32 = 1;

/// Control loop period (ms).
pub const CONTROL_TICK_MS: u64 = 10;

// BLE

/// Advertised device name.
pub const DEVICE_NAME: &str = "m5-temperature-1";

/// Primary service UUID `224c9411-d6cb-4b2e-b4cb-ab687eb7de23`, big-endian
/// (as written). The SoftDevice wants it little-endian, see
/// [`SERVICE_UUID_LE`].
pub const SERVICE_UUID: [u8; 16] = [
    0x22, 0x4c, 0x94, 0x11, 0xd6, 0xcb, 0x4b, 0x2e, 0xb4, 0xcb, 0xab, 0x68, 0x7e, 0xb7, 0xde, 0x23,
];

/// [`SERVICE_UUID`] in over-the-air (little-endian) byte order.
pub const SERVICE_UUID_LE: [u8; 16] = reverse_uuid(SERVICE_UUID);

/// Temperature characteristic (org.bluetooth.characteristic.temperature).
pub const TEMPERATURE_CHAR_UUID: u16 = 0x2A6E;

/// Characteristic User Description descriptor.
pub const USER_DESCRIPTION_UUID: u16 = 0x2901;

/// Text of the user description descriptor.
pub const TEMPERATURE_DESCRIPTION: &str = "Temp: [-10,40]°C";

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const ADV_INTERVAL: u32 = 160;

// Sensor

/// Lowest temperature the node reports (°C).
pub const TEMP_MIN_C: i8 = -10;

/// Highest temperature the node reports (°C).
pub const TEMP_MAX_C: i8 = 40;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Button A (clear display)     → P0.11
//   Button B (toggle duty cycle) → P0.12
//   Button C (hard reset)        → P0.24
//   I²C SDA                      → P0.26
//   I²C SCL                      → P0.27

/// A button counts as released only after being held this long (ms).
pub const BUTTON_HOLD_MS: u64 = 5;

/// Lines kept by the on-screen console (6x10 font on 64 px).
pub const CONSOLE_LINES: usize = 6;

/// Characters per console line (6 px glyphs on 128 px).
pub const CONSOLE_COLUMNS: usize = 21;

/// What the node does when a central disconnects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisconnectPolicy {
    /// Start advertising again right away; the scheduler is untouched.
    ResumeAdvertising,
    /// Halt for [`RESET_HALT_SECS`] so the radio comes back from reset.
    ResetRadio,
}

/// How much the node writes to its on-screen console.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebugLevel {
    Off = 0,
    /// Boot banner, UUIDs, duty-cycle changes.
    Light = 1,
    /// Everything, including each produced value.
    Verbose = 2,
}

/// Tunables handed to the scheduler and the event adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    pub awake_secs: u32,
    pub sleep_secs: u32,
    pub activity_timeout_secs: u32,
    pub reset_halt_secs: u32,
    pub disconnect_policy: DisconnectPolicy,
    pub debug_level: DebugLevel,
}

impl NodeConfig {
    /// Build-time configuration.
    pub const DEFAULT: Self = Self {
        awake_secs: AWAKE_SECONDS,
        sleep_secs: SLEEP_SECONDS,
        activity_timeout_secs: ACTIVITY_TIMEOUT_SECONDS,
        reset_halt_secs: RESET_HALT_SECS,
        disconnect_policy: DISCONNECT_POLICY,
        debug_level: DEBUG_LEVEL,
    };
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(feature = "disconnect-reset")]
pub const DISCONNECT_POLICY: DisconnectPolicy = DisconnectPolicy::ResetRadio;
#[cfg(not(feature = "disconnect-reset"))]
pub const DISCONNECT_POLICY: DisconnectPolicy = DisconnectPolicy::ResumeAdvertising;

#[cfg(feature = "debug-verbose")]
pub const DEBUG_LEVEL: DebugLevel = DebugLevel::Verbose;
#[cfg(all(feature = "debug-light", not(feature = "debug-verbose")))]
pub const DEBUG_LEVEL: DebugLevel = DebugLevel::Light;
#[cfg(not(feature = "debug-light"))]
pub const DEBUG_LEVEL: DebugLevel = DebugLevel::Off;

const fn reverse_uuid(be: [u8; 16]) -> [u8; 16] {
    let mut le = [0u8; 16];
    let mut i = 0;
    while i < 16 {
        le[i] = be[15 - i];
        i += 1;
    }
    le
}
