//! # Packet Decoder
//!
//! Decodes a response frame from bytes accumulated off the serial link.
//! Decoding never blocks; waiting for more bytes is the caller's job.

use super::protocol::*;

/// Result of one decode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete frame starting at offset 0
    Frame {
        /// The parsed frame
        frame: Frame,
        /// Bytes of the buffer the frame occupied
        consumed: usize,
    },

    /// Buffer holds a valid prefix; keep accumulating
    NeedMoreData,

    /// Buffer can never become a valid frame
    Malformed(String),
}

/// Decode a frame from the front of `buffer`
///
/// The carried checksum is extracted but not verified; callers that want
/// strict behaviour check [`Frame::has_valid_checksum`].
///
/// # Arguments
///
/// * `buffer` - Bytes received so far
///
/// # Returns
///
/// * `Decoded::NeedMoreData` - fewer than 12 bytes, or fewer than `9 + length`
/// * `Decoded::Malformed` - wrong start marker, impossible length, unknown kind
/// * `Decoded::Frame` - the frame and the number of bytes it used
pub fn decode_frame(buffer: &[u8]) -> Decoded {
    if buffer.len() < MIN_FRAME_SIZE {
        return Decoded::NeedMoreData;
    }

    if buffer[0..2] != START_MARKER_BYTES {
        return Decoded::Malformed(format!(
            "Invalid start marker: 0x{:02X}{:02X}",
            buffer[0], buffer[1]
        ));
    }

    let length = u16::from_be_bytes([buffer[7], buffer[8]]) as usize;
    if length < CHECKSUM_SIZE {
        return Decoded::Malformed(format!("Declared length {} shorter than checksum", length));
    }

    let total = HEADER_SIZE + length;
    if buffer.len() < total {
        return Decoded::NeedMoreData;
    }

    let kind = match PacketKind::from_byte(buffer[6]) {
        Some(kind) => kind,
        None => {
            return Decoded::Malformed(format!("Unknown packet kind: 0x{:02X}", buffer[6]));
        }
    };

    let address = u32::from_be_bytes([buffer[2], buffer[3], buffer[4], buffer[5]]);
    let payload_end = total - CHECKSUM_SIZE;
    let payload = buffer[HEADER_SIZE..payload_end].to_vec();
    let checksum = u16::from_be_bytes([buffer[payload_end], buffer[payload_end + 1]]);

    Decoded::Frame {
        frame: Frame {
            address,
            kind,
            payload,
            checksum,
        },
        consumed: total,
    }
}
