//! Workflow results
//!
//! Everything the sensor can legitimately answer (no finger yet, no match,
//! a phase that failed) is an outcome value, not an error. Errors are left
//! for the link itself misbehaving.

use std::fmt;

use crate::packet::status::StatusCode;

/// Result of capture-with-retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// An image is in the sensor's image buffer
    Captured {
        /// Capture commands issued, including the successful one
        attempts: u32,
    },

    /// Every attempt reported no finger
    CaptureTimeout,

    /// The sensor reported something other than "no finger yet"
    Failed(StatusCode),
}

/// Steps of an identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifyPhase {
    Capture,
    Convert,
    Search,
}

impl IdentifyPhase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Convert => "convert",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for IdentifyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of identify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyOutcome {
    /// The finger matches a stored template
    Matched { id: u16, confidence: u16 },

    /// A clean capture that matches nothing in the library
    NotFound,

    /// Nobody put a finger on the sensor
    CaptureTimeout,

    /// Capture or conversion was refused by the sensor
    ProtocolError {
        phase: IdentifyPhase,
        status: StatusCode,
    },
}

/// Steps of an enrollment, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrollPhase {
    CaptureFirst,
    ConvertFirst,
    CaptureSecond,
    ConvertSecond,
    Register,
    Store,
}

impl EnrollPhase {
    pub fn name(self) -> &'static str {
        match self {
            Self::CaptureFirst => "first capture",
            Self::ConvertFirst => "first conversion",
            Self::CaptureSecond => "second capture",
            Self::ConvertSecond => "second conversion",
            Self::Register => "model registration",
            Self::Store => "model storage",
        }
    }

    /// What the operator should do before retrying
    pub fn remediation(self) -> &'static str {
        match self {
            Self::CaptureFirst | Self::CaptureSecond => {
                "capture failed, clean the sensor window and reposition the finger"
            }
            Self::ConvertFirst | Self::ConvertSecond => {
                "image unusable, press the finger flat and cover more of the sensor"
            }
            Self::Register => "the two captures did not agree, use the same finger both times",
            Self::Store => "the sensor could not save the model, check the location is inside the library",
        }
    }
}

impl fmt::Display for EnrollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of enroll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// Model saved at `location`
    Stored { location: u16 },

    /// A phase was refused; nothing was stored
    PhaseFailed {
        phase: EnrollPhase,
        status: StatusCode,
    },

    /// No finger arrived during one of the two captures
    CaptureTimeout { phase: EnrollPhase },
}
