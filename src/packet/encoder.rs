//! # Packet Encoder
//!
//! Encodes commands into complete wire frames.

use super::command::Command;
use super::protocol::*;
use crate::error::Result;

/// Encode a payload into a complete frame
///
/// # Arguments
///
/// * `address` - Module address
/// * `kind` - Packet kind
/// * `payload` - Payload bytes (max 256)
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Marker + address + kind + length + payload + checksum
///
/// # Errors
///
/// Returns error if payload is empty or exceeds MAX_PAYLOAD_SIZE (256 bytes)
///
/// # Examples
///
/// ```
/// use zfm_fingerprint::packet::encoder::encode_frame;
/// use zfm_fingerprint::packet::protocol::PacketKind;
///
/// let frame = encode_frame(0xFFFFFFFF, PacketKind::Command, &[0x01])?;
/// assert_eq!(frame, [0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]);
/// # Ok::<(), zfm_fingerprint::error::FingerprintError>(())
/// ```
pub fn encode_frame(address: u32, kind: PacketKind, payload: &[u8]) -> Result<Vec<u8>> {
    let frame = Frame::new(address, kind, payload.to_vec())?;
    Ok(encode(&frame))
}

/// Serialize an already validated frame, keeping its carried checksum
pub fn encode(frame: &Frame) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.wire_len());
    bytes.extend_from_slice(&START_MARKER_BYTES);
    bytes.extend_from_slice(&frame.address.to_be_bytes());
    bytes.push(frame.kind.as_byte());
    bytes.extend_from_slice(&frame.length().to_be_bytes());
    bytes.extend_from_slice(&frame.payload);
    bytes.extend_from_slice(&frame.checksum.to_be_bytes());
    bytes
}

/// Encode a command as a Command-kind frame
pub fn encode_command(address: u32, command: &Command) -> Result<Vec<u8>> {
    encode_frame(address, PacketKind::Command, &command.to_payload())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::command::Slot;

    #[test]
    fn test_encode_verify_password_exact_bytes() {
        let frame = encode_frame(0xFFFFFFFF, PacketKind::Command, &[0x13, 0, 0, 0, 0]).unwrap();
        assert_eq!(
            frame,
            vec![0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x07, 0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1B]
        );
    }

    #[test]
    fn test_encode_is_deterministic() {
        for len in 1..=MAX_PAYLOAD_SIZE {
            let payload: Vec<u8> = (0..len).map(|i| (i * 37 + len) as u8).collect();
            let first = encode_frame(0x12345678, PacketKind::Command, &payload).unwrap();
            let second = encode_frame(0x12345678, PacketKind::Command, &payload).unwrap();
            assert_eq!(first, second, "payload length {}", len);
        }
    }

    #[test]
    fn test_encode_rejects_empty_payload() {
        assert!(matches!(
            encode_frame(DEFAULT_ADDRESS, PacketKind::Command, &[]),
            Err(crate::error::FingerprintError::Protocol(_))
        ));
    }

    #[test]
    fn test_encode_address_big_endian() {
        let frame = encode_frame(0x0A0B0C0D, PacketKind::Command, &[0x1D]).unwrap();
        assert_eq!(&frame[2..6], &[0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[test]
    fn test_encode_length_field() {
        let frame = encode_frame(DEFAULT_ADDRESS, PacketKind::Data, &[0u8; 128]).unwrap();
        assert_eq!(&frame[7..9], &[0x00, 130]);
        assert_eq!(frame.len(), HEADER_SIZE + 128 + CHECKSUM_SIZE);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        assert!(encode_frame(DEFAULT_ADDRESS, PacketKind::Data, &[0u8; 300]).is_err());
    }

    #[test]
    fn test_encode_store_command() {
        let command = Command::StoreModel {
            slot: Slot::One,
            location: 0x0102,
        };
        let frame = encode_command(DEFAULT_ADDRESS, &command).unwrap();
        assert_eq!(&frame[6..9], &[0x01, 0x00, 0x06]);
        assert_eq!(&frame[9..13], &[0x06, 0x01, 0x01, 0x02]);
        // 0x01 + 0x00 + 0x06 + 0x06 + 0x01 + 0x01 + 0x02 = 0x11
        assert_eq!(&frame[13..], &[0x00, 0x11]);
    }
}
