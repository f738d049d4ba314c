//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Advertising** - connectable, scannable undirected advertising of
//!    the temperature service UUID, with the device name in the scan
//!    response.
//! 2. **GATT server** - one read-only temperature characteristic whose
//!    value is produced on demand (deferred read).
//! 3. **Events** - connect, disconnect and read are forwarded to the
//!    [`events::PeripheralEvents`] adapter, which is the only path from
//!    the radio into the duty-cycle scheduler.

pub mod adv_data;
pub mod events;
pub mod server;
