//! # Packet Checksum
//!
//! 16-bit additive checksum over packet kind, length and payload.
//! The start marker and address are not covered.

/// Sum bytes into a wrapping 16-bit accumulator
///
/// # Arguments
///
/// * `data` - Bytes to sum
///
/// # Returns
///
/// * `u16` - Sum of all bytes modulo 65536
pub fn sum16(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |acc, &byte| acc.wrapping_add(byte as u16))
}

/// Calculate the checksum of one packet
///
/// # Arguments
///
/// * `kind` - Packet kind byte
/// * `length` - Declared length field (payload + 2)
/// * `payload` - Payload bytes
///
/// # Examples
///
/// ```
/// use zfm_fingerprint::packet::checksum::packet_checksum;
///
/// // VerifyPassword with password 0
/// let sum = packet_checksum(0x01, 7, &[0x13, 0, 0, 0, 0]);
/// assert_eq!(sum, 0x001B);
/// ```
pub fn packet_checksum(kind: u8, length: u16, payload: &[u8]) -> u16 {
    let [length_hi, length_lo] = length.to_be_bytes();
    sum16(&[kind, length_hi, length_lo]).wrapping_add(sum16(payload))
}

/// Direct summation over u32 (slow, for verification)
#[cfg(test)]
fn packet_checksum_wide(kind: u8, length: u16, payload: &[u8]) -> u16 {
    let mut sum: u32 = kind as u32 + (length >> 8) as u32 + (length & 0xFF) as u32;
    for &byte in payload {
        sum += byte as u32;
    }
    (sum % 65536) as u16
}
