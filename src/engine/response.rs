//! Structured view of one Ack frame

use crate::error::{FingerprintError, Result};
use crate::packet::protocol::Frame;
use crate::packet::status::StatusCode;

/// Status plus command-specific extra bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Confirmation code (first payload byte)
    pub status: StatusCode,

    /// Remaining payload bytes, meaning depends on the command
    pub extra: Vec<u8>,
}

/// A library hit returned by `search`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Library location of the matching template
    pub id: u16,

    /// Match score
    pub confidence: u16,
}

impl Response {
    /// Split a frame payload into status and extra bytes
    ///
    /// # Errors
    ///
    /// Returns error if the payload is empty
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let (&status, extra) = frame.payload.split_first().ok_or_else(|| {
            FingerprintError::MalformedFrame("Response has no status byte".to_string())
        })?;

        Ok(Self {
            status: StatusCode::from_byte(status),
            extra: extra.to_vec(),
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Search hit: id and confidence, big-endian u16 each
    pub fn search_match(&self) -> Option<SearchMatch> {
        if !self.is_ok() {
            return None;
        }
        Some(SearchMatch {
            id: self.u16_at(0)?,
            confidence: self.u16_at(2)?,
        })
    }

    /// Template-count result, big-endian u16
    pub fn template_count(&self) -> Option<u16> {
        if !self.is_ok() {
            return None;
        }
        self.u16_at(0)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let bytes = self.extra.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::protocol::{PacketKind, DEFAULT_ADDRESS};

    fn response(payload: &[u8]) -> Result<Response> {
        let frame = Frame::new(DEFAULT_ADDRESS, PacketKind::Ack, payload.to_vec())?;
        Response::from_frame(&frame)
    }

    #[test]
    fn test_status_and_extra_split() {
        let response = response(&[0x00, 0x00, 0x07, 0x00, 0x50]).unwrap();
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.extra, vec![0x00, 0x07, 0x00, 0x50]);
    }

    #[test]
    fn test_search_match_decoding() {
        let response = response(&[0x00, 0x01, 0x02, 0x00, 0xC8]).unwrap();
        assert_eq!(
            response.search_match(),
            Some(SearchMatch { id: 0x0102, confidence: 200 })
        );
    }

    #[test]
    fn test_search_match_requires_ok() {
        let response = response(&[0x09, 0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(response.search_match(), None);
    }

    #[test]
    fn test_search_match_short_extra() {
        let response = response(&[0x00, 0x01]).unwrap();
        assert_eq!(response.search_match(), None);
    }

    #[test]
    fn test_template_count() {
        let response = response(&[0x00, 0x00, 0x0C]).unwrap();
        assert_eq!(response.template_count(), Some(12));
    }

    #[test]
    fn test_empty_payload_is_malformed() {
        let result = response(&[]);
        assert!(matches!(result, Err(FingerprintError::MalformedFrame(_))));
    }
}
