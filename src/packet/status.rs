//! # Status Codes
//!
//! Confirmation codes carried in the first payload byte of every Ack.

use std::fmt;

/// Sensor confirmation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    PacketReceiveError,
    NoFingerDetected,
    ImageCaptureFailed,
    ImageTooMessy,
    FeatureExtractionFailed,
    NoMatch,
    NotFound,
    EnrollMismatch,
    InvalidLocation,
    DatabaseRangeExceeded,
    UploadFeatureFailed,
    PacketResponseFailed,
    UploadFailed,
    DeleteFailed,
    DatabaseClearFailed,
    PasswordFailed,
    InvalidImage,
    FlashError,
    /// Any code outside the enumerated set
    Unknown(u8),
}

impl StatusCode {
    /// Map a wire byte to a status
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Ok,
            0x01 => Self::PacketReceiveError,
            0x02 => Self::NoFingerDetected,
            0x03 => Self::ImageCaptureFailed,
            0x06 => Self::ImageTooMessy,
            0x07 => Self::FeatureExtractionFailed,
            0x08 => Self::NoMatch,
            0x09 => Self::NotFound,
            0x0A => Self::EnrollMismatch,
            0x0B => Self::InvalidLocation,
            0x0C => Self::DatabaseRangeExceeded,
            0x0D => Self::UploadFeatureFailed,
            0x0E => Self::PacketResponseFailed,
            0x0F => Self::UploadFailed,
            0x10 => Self::DeleteFailed,
            0x11 => Self::DatabaseClearFailed,
            0x13 => Self::PasswordFailed,
            0x15 => Self::InvalidImage,
            0x18 => Self::FlashError,
            other => Self::Unknown(other),
        }
    }

    /// Wire byte for this status
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::PacketReceiveError => 0x01,
            Self::NoFingerDetected => 0x02,
            Self::ImageCaptureFailed => 0x03,
            Self::ImageTooMessy => 0x06,
            Self::FeatureExtractionFailed => 0x07,
            Self::NoMatch => 0x08,
            Self::NotFound => 0x09,
            Self::EnrollMismatch => 0x0A,
            Self::InvalidLocation => 0x0B,
            Self::DatabaseRangeExceeded => 0x0C,
            Self::UploadFeatureFailed => 0x0D,
            Self::PacketResponseFailed => 0x0E,
            Self::UploadFailed => 0x0F,
            Self::DeleteFailed => 0x10,
            Self::DatabaseClearFailed => 0x11,
            Self::PasswordFailed => 0x13,
            Self::InvalidImage => 0x15,
            Self::FlashError => 0x18,
            Self::Unknown(byte) => byte,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Human-readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::PacketReceiveError => "error receiving packet",
            Self::NoFingerDetected => "no finger on the sensor",
            Self::ImageCaptureFailed => "failed to capture image",
            Self::ImageTooMessy => "image too messy",
            Self::FeatureExtractionFailed => "too few feature points",
            Self::NoMatch => "fingerprints do not match",
            Self::NotFound => "no matching template",
            Self::EnrollMismatch => "captures could not be combined",
            Self::InvalidLocation => "location outside the library",
            Self::DatabaseRangeExceeded => "error reading template from library",
            Self::UploadFeatureFailed => "error uploading template",
            Self::PacketResponseFailed => "module cannot accept data packets",
            Self::UploadFailed => "error uploading image",
            Self::DeleteFailed => "failed to delete template",
            Self::DatabaseClearFailed => "failed to clear library",
            Self::PasswordFailed => "wrong password",
            Self::InvalidImage => "no valid image in buffer",
            Self::FlashError => "error writing flash",
            Self::Unknown(_) => "unknown status",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.as_byte())
    }
}
