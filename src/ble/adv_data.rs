//! Advertising and scan-response payloads.
//!
//! The 128-bit service UUID and the flags fill most of the 31-byte
//! advertising packet, so the device name goes in the scan response.

use heapless::String;

/// Maximum legacy advertising / scan response payload.
pub const MAX_ADV_LEN: usize = 31;

const AD_FLAGS: u8 = 0x01;
const AD_COMPLETE_128_UUIDS: u8 = 0x07;
const AD_SHORTENED_NAME: u8 = 0x08;
const AD_COMPLETE_NAME: u8 = 0x09;

/// LE General Discoverable | BR/EDR not supported.
const FLAGS: u8 = 0x06;

/// Flags + complete list of 128-bit service UUIDs.
///
/// `uuid_le` is in over-the-air byte order. Returns the bytes written,
/// or 0 if `out` is too small.
pub fn build_adv_data(uuid_le: &[u8; 16], out: &mut [u8]) -> usize {
    let total = 3 + 2 + uuid_le.len();
    if out.len() < total {
        return 0;
    }
    out[0] = 0x02;
    out[1] = AD_FLAGS;
    out[2] = FLAGS;
    out[3] = 1 + uuid_le.len() as u8;
    out[4] = AD_COMPLETE_128_UUIDS;
    out[5..total].copy_from_slice(uuid_le);
    total
}

/// Local name, shortened if it does not fit.
pub fn build_scan_data(name: &str, out: &mut [u8]) -> usize {
    let room = out.len().min(MAX_ADV_LEN);
    if room < 3 {
        return 0;
    }
    let bytes = name.as_bytes();
    let fits = bytes.len().min(room - 2);
    out[0] = 1 + fits as u8;
    out[1] = if fits == bytes.len() {
        AD_COMPLETE_NAME
    } else {
        AD_SHORTENED_NAME
    };
    out[2..2 + fits].copy_from_slice(&bytes[..fits]);
    2 + fits
}

/// `8-4-4-4-12` lowercase hex, from big-endian bytes.
pub fn format_uuid128(uuid_be: &[u8; 16]) -> String<36> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::new();
    for (i, &b) in uuid_be.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            let _ = s.push('-');
        }
        let _ = s.push(HEX[(b >> 4) as usize] as char);
        let _ = s.push(HEX[(b & 0x0F) as usize] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEVICE_NAME, SERVICE_UUID, SERVICE_UUID_LE};

    #[test]
    fn adv_data_carries_flags_and_uuid() {
        let mut buf = [0u8; MAX_ADV_LEN];
        let len = build_adv_data(&SERVICE_UUID_LE, &mut buf);
        assert_eq!(len, 21);
        assert_eq!(&buf[..5], &[0x02, 0x01, 0x06, 0x11, 0x07]);
        assert_eq!(buf[5], 0x23); // last byte of the UUID goes first
        assert_eq!(buf[20], 0x22);
    }

    #[test]
    fn adv_data_needs_room() {
        let mut buf = [0u8; 10];
        assert_eq!(build_adv_data(&SERVICE_UUID_LE, &mut buf), 0);
    }

    #[test]
    fn scan_data_holds_full_name() {
        let mut buf = [0u8; MAX_ADV_LEN];
        let len = build_scan_data(DEVICE_NAME, &mut buf);
        assert_eq!(len, 2 + DEVICE_NAME.len());
        assert_eq!(buf[1], 0x09);
        assert_eq!(&buf[2..len], DEVICE_NAME.as_bytes());
    }

    #[test]
    fn long_name_is_shortened() {
        let mut buf = [0u8; MAX_ADV_LEN];
        let name = "a-node-name-that-is-far-too-long-to-fit";
        let len = build_scan_data(name, &mut buf);
        assert_eq!(len, MAX_ADV_LEN);
        assert_eq!(buf[0], 30);
        assert_eq!(buf[1], 0x08);
    }

    #[test]
    fn uuid_formats_like_the_registry() {
        assert_eq!(
            format_uuid128(&SERVICE_UUID).as_str(),
            "224c9411-d6cb-4b2e-b4cb-ab687eb7de23"
        );
    }
}
