//! CRC16 checksum used by CCNET frames.
//!
//! The algorithm is the reflected CCITT variant with polynomial `0x8408` and an
//! initial accumulator of zero (sometimes listed as CRC-16/KERMIT without the
//! final byte swap).  The low byte of the result is transmitted first.

/// Reflected polynomial used by the validator firmware.
pub const CRC16_POLYNOMIAL: u16 = 0x8408;

/// Computes the frame checksum over `bytes`.
///
/// # Examples
///
/// ```rust
/// use ccnet_core::protocol::crc::crc16;
///
/// assert_eq!(crc16(&[]), 0x0000);
/// assert_eq!(crc16(b"123456789"), 0x2189);
/// ```
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in bytes {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 0x0001 != 0 {
                (crc >> 1) ^ CRC16_POLYNOMIAL
            } else {
                crc >> 1
            };
        }
    }
    crc
}

/// Splits a checksum into the two bytes in wire order (low, high).
pub fn checksum_bytes(crc: u16) -> [u8; 2] {
    crc.to_le_bytes()
}
