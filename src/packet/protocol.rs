//! # Packet Protocol Constants and Types
//!
//! Core wire definitions for the ZFM/AS608 fingerprint sensor protocol.
//!
//! ```text
//! [0:2)   start marker 0xEF01
//! [2:6)   address (u32, big-endian)
//! [6:7)   packet kind
//! [7:9)   length = payload + 2 (u16, big-endian)
//! [9:..)  payload
//! [..+2)  checksum = kind + length_hi + length_lo + payload, mod 65536
//! ```

use super::checksum::packet_checksum;
use crate::error::{FingerprintError, Result};

/// Frame start marker (always 0xEF01)
pub const START_MARKER: u16 = 0xEF01;

/// Start marker as it appears on the wire
pub const START_MARKER_BYTES: [u8; 2] = START_MARKER.to_be_bytes();

/// Default module address (broadcast)
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Default handshake password
pub const DEFAULT_PASSWORD: u32 = 0x0000_0000;

/// Bytes before the payload: marker(2) + address(4) + kind(1) + length(2)
pub const HEADER_SIZE: usize = 9;

/// Size of the trailing checksum field
pub const CHECKSUM_SIZE: usize = 2;

/// Smallest response worth inspecting: header + one status byte + checksum
pub const MIN_FRAME_SIZE: usize = 12;

/// Largest payload the sensor accepts in one packet
pub const MAX_PAYLOAD_SIZE: usize = 256;

/// Role of a frame on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Host to sensor instruction
    Command,
    /// Data chunk (image/template transfer)
    Data,
    /// Sensor acknowledgement carrying a status byte
    Ack,
    /// Final data chunk
    EndOfData,
}

impl PacketKind {
    /// Wire identifier byte
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Command => 0x01,
            Self::Data => 0x02,
            Self::Ack => 0x07,
            Self::EndOfData => 0x08,
        }
    }

    /// Parse a wire identifier byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Command),
            0x02 => Some(Self::Data),
            0x07 => Some(Self::Ack),
            0x08 => Some(Self::EndOfData),
            _ => None,
        }
    }
}

/// One complete protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Module address
    pub address: u32,

    /// Packet kind
    pub kind: PacketKind,

    /// Payload (opcode/status byte first)
    pub payload: Vec<u8>,

    /// Checksum as carried on the wire
    pub checksum: u16,
}

impl Frame {
    /// Create a frame with a freshly computed checksum
    ///
    /// # Errors
    ///
    /// Returns error if payload is empty or exceeds MAX_PAYLOAD_SIZE
    pub fn new(address: u32, kind: PacketKind, payload: Vec<u8>) -> Result<Self> {
        // Shorter than MIN_FRAME_SIZE on the wire, so it could never be decoded
        if payload.is_empty() {
            return Err(FingerprintError::Protocol("Payload cannot be empty".to_string()));
        }

        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FingerprintError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let length = (payload.len() + CHECKSUM_SIZE) as u16;
        let checksum = packet_checksum(kind.as_byte(), length, &payload);

        Ok(Self {
            address,
            kind,
            payload,
            checksum,
        })
    }

    /// Declared length field (payload + checksum)
    ///
    /// Cannot overflow since payload is validated to be ≤ 256 bytes on
    /// construction and ≤ 65533 bytes when decoded.
    pub fn length(&self) -> u16 {
        (self.payload.len() + CHECKSUM_SIZE) as u16
    }

    /// Checksum recomputed from kind, length and payload
    pub fn expected_checksum(&self) -> u16 {
        packet_checksum(self.kind.as_byte(), self.length(), &self.payload)
    }

    /// True if the carried checksum matches the contents
    pub fn has_valid_checksum(&self) -> bool {
        self.expected_checksum() == self.checksum
    }

    /// Total size of this frame on the wire
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }
}
