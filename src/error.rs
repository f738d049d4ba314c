//! Unified error type for tempnode.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! Everything here is a startup failure. Once the tasks are running,
//! the firmware logs and retries instead of returning errors.

use defmt::Format;

/// Top-level error type used across the application.
#[derive(Debug, Format)]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // UI / Display
    /// I²C transaction to the display failed.
    Display,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, Format)]
pub enum BleError {
    /// Service, characteristic or descriptor registration failed.
    Register,
    /// The SoftDevice RNG could not be read.
    Random,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

impl From<nrf_softdevice::ble::gatt_server::RegisterError> for Error {
    fn from(_: nrf_softdevice::ble::gatt_server::RegisterError) -> Self {
        Error::Ble(BleError::Register)
    }
}
