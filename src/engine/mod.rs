//! # Command Protocol Engine
//!
//! Issues one command at a time and waits for its single response.
//!
//! This module handles:
//! - Draining stale bytes left on the link by an earlier exchange
//! - Encoding and writing Command frames
//! - Accumulating reply bytes until a frame decodes, bounded by a timeout
//! - Splitting the reply into a status code and command-specific extras
//!
//! The framing carries no request id, so the engine must never have more
//! than one command outstanding. It takes `&mut self` for every exchange;
//! sharing an engine between tasks goes through [`crate::gate::SensorGate`].

pub mod response;

pub use response::{Response, SearchMatch};

use std::time::Duration;

use bytes::BytesMut;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::discovery::LinkCandidate;
use crate::error::{FingerprintError, Result};
use crate::packet::command::{Command, Slot};
use crate::packet::decoder::{decode_frame, Decoded};
use crate::packet::encoder::encode_command;
use crate::packet::protocol::{Frame, PacketKind, DEFAULT_ADDRESS, DEFAULT_PASSWORD};
use crate::packet::status::StatusCode;
use crate::serial::port_trait::SensorTransport;

/// Per-read scratch size; replies to the supported commands fit in one
const READ_CHUNK_SIZE: usize = 64;

/// Address and password presented to the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub address: u32,
    pub password: u32,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            password: DEFAULT_PASSWORD,
        }
    }
}

/// Live connection state, fixed once the engine is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Address and password used for every frame
    pub credentials: Credentials,

    /// Link configuration the sensor answered on
    pub link: LinkCandidate,
}

/// Sends commands to one sensor over an exclusively owned transport
pub struct CommandEngine<T: SensorTransport> {
    transport: T,
    session: Session,
    strict_checksum: bool,
}

impl<T: SensorTransport> std::fmt::Debug for CommandEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEngine")
            .field("session", &self.session)
            .field("strict_checksum", &self.strict_checksum)
            .finish_non_exhaustive()
    }
}

impl<T: SensorTransport> CommandEngine<T> {
    /// Create an engine over an opened transport
    ///
    /// No handshake is performed; call [`verify_password`](Self::verify_password)
    /// before trusting the link.
    pub fn new(transport: T, session: Session) -> Self {
        Self {
            transport,
            session,
            strict_checksum: false,
        }
    }

    /// Reject replies whose checksum does not match their contents
    ///
    /// Off by default: the sensor family is known to be accepted without
    /// verification, so leniency is the compatible choice.
    pub fn with_strict_checksum(mut self, strict: bool) -> Self {
        self.strict_checksum = strict;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Close the session and hand the transport back
    pub fn into_transport(self) -> T {
        info!("Closing sensor session on {}", self.session.link);
        self.transport
    }

    /// Send one command and wait for its response
    ///
    /// # Arguments
    ///
    /// * `command` - Command to send
    /// * `timeout` - Upper bound on the wait for a complete reply
    ///
    /// # Returns
    ///
    /// * `Result<Response>` - Status and extra bytes of the reply
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Writing to the transport fails
    /// - Draining stale input and reading the reply together take longer
    ///   than `timeout` (`Timeout`)
    /// - The reply cannot be parsed (`MalformedFrame`)
    /// - Strict checksum mode is on and the reply checksum is wrong
    ///
    /// A non-Ok status is not an error here; the caller decides what it means.
    pub async fn execute(&mut self, command: &Command, timeout: Duration) -> Result<Response> {
        let bytes = encode_command(self.session.credentials.address, command)?;
        let deadline = Instant::now() + timeout;
        let timed_out = || FingerprintError::Timeout {
            command: command.name(),
            timeout_ms: timeout.as_millis() as u64,
        };

        // A peer that never stops talking must not hold the exchange past the deadline
        let discarded = timeout_at(deadline, self.discard_stale())
            .await
            .map_err(|_| timed_out())??;
        if discarded > 0 {
            debug!("Discarded {} stale bytes before {}", discarded, command.name());
        }

        self.transport
            .write_all(&bytes)
            .await
            .map_err(|e| FingerprintError::Serial(format!("Failed to write {}: {}", command.name(), e)))?;
        self.transport
            .flush()
            .await
            .map_err(|e| FingerprintError::Serial(format!("Failed to flush serial port: {}", e)))?;
        debug!("Sent {} ({} bytes): {:02X?}", command.name(), bytes.len(), bytes);

        let frame = timeout_at(deadline, self.read_frame())
            .await
            .map_err(|_| timed_out())??;

        if frame.kind != PacketKind::Ack {
            debug!("{} answered with {:?} packet", command.name(), frame.kind);
        }

        if !frame.has_valid_checksum() {
            if self.strict_checksum {
                return Err(FingerprintError::ChecksumMismatch {
                    expected: frame.expected_checksum(),
                    received: frame.checksum,
                });
            }
            debug!(
                "Accepting {} reply with checksum 0x{:04X} (expected 0x{:04X})",
                command.name(),
                frame.checksum,
                frame.expected_checksum()
            );
        }

        let response = Response::from_frame(&frame)?;
        debug!("{} -> {}", command.name(), response.status);
        Ok(response)
    }

    /// Handshake with the configured password
    ///
    /// Any outcome other than an Ok status, including a timeout or a link
    /// error, counts as a failed handshake. Nothing is propagated; the
    /// caller decides whether to abandon the link.
    pub async fn verify_password(&mut self, timeout: Duration) -> bool {
        let command = Command::VerifyPassword {
            password: self.session.credentials.password,
        };

        match self.execute(&command, timeout).await {
            Ok(response) if response.is_ok() => {
                info!("Sensor handshake succeeded on {}", self.session.link);
                true
            }
            Ok(response) => {
                warn!("Sensor on {} rejected handshake: {}", self.session.link, response.status);
                false
            }
            Err(e) => {
                warn!("Handshake on {} failed: {}", self.session.link, e);
                false
            }
        }
    }

    /// Capture a fingerprint image into the image buffer
    pub async fn capture_image(&mut self, timeout: Duration) -> Result<StatusCode> {
        Ok(self.execute(&Command::CaptureImage, timeout).await?.status)
    }

    /// Extract features from the image buffer into `slot`
    pub async fn image_to_template(&mut self, slot: Slot, timeout: Duration) -> Result<StatusCode> {
        Ok(self.execute(&Command::ImageToTemplate { slot }, timeout).await?.status)
    }

    /// Combine both slots into one model
    pub async fn register_model(&mut self, timeout: Duration) -> Result<StatusCode> {
        Ok(self.execute(&Command::RegisterModel, timeout).await?.status)
    }

    /// Persist the model held in `slot` at `location`
    pub async fn store_model(&mut self, slot: Slot, location: u16, timeout: Duration) -> Result<StatusCode> {
        Ok(self
            .execute(&Command::StoreModel { slot, location }, timeout)
            .await?
            .status)
    }

    /// Search library locations `start..=end` for the features in `slot`
    pub async fn search(&mut self, slot: Slot, start: u16, end: u16, timeout: Duration) -> Result<Response> {
        self.execute(&Command::Search { slot, start, end }, timeout).await
    }

    /// Delete `count` templates starting at `location`
    pub async fn delete_model(&mut self, location: u16, count: u16, timeout: Duration) -> Result<StatusCode> {
        Ok(self
            .execute(&Command::DeleteModel { location, count }, timeout)
            .await?
            .status)
    }

    /// Delete every stored template
    pub async fn empty_database(&mut self, timeout: Duration) -> Result<StatusCode> {
        Ok(self.execute(&Command::EmptyDatabase, timeout).await?.status)
    }

    /// Read the number of stored templates
    pub async fn template_count(&mut self, timeout: Duration) -> Result<Response> {
        self.execute(&Command::TemplateCount, timeout).await
    }

    /// Read and drop whatever is already waiting on the link
    async fn discard_stale(&mut self) -> Result<usize> {
        let mut scratch = [0u8; READ_CHUNK_SIZE];
        let mut discarded = 0;

        loop {
            let available = self
                .transport
                .bytes_available()
                .map_err(|e| FingerprintError::Serial(format!("Failed to poll serial port: {}", e)))?;
            if available == 0 {
                return Ok(discarded);
            }

            let want = available.min(scratch.len());
            let read = self
                .transport
                .read_chunk(&mut scratch[..want])
                .await
                .map_err(|e| FingerprintError::Serial(format!("Failed to read serial port: {}", e)))?;
            if read == 0 {
                return Ok(discarded);
            }
            discarded += read;
        }
    }

    /// Accumulate bytes until one frame decodes
    ///
    /// Never returns on a silent link; [`execute`](Self::execute) bounds it.
    async fn read_frame(&mut self) -> Result<Frame> {
        let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let read = self
                .transport
                .read_chunk(&mut chunk)
                .await
                .map_err(|e| FingerprintError::Serial(format!("Failed to read serial port: {}", e)))?;
            if read == 0 {
                return Err(FingerprintError::Serial("Serial port closed".to_string()));
            }
            buffer.extend_from_slice(&chunk[..read]);

            match decode_frame(&buffer) {
                Decoded::Frame { frame, consumed } => {
                    if consumed < buffer.len() {
                        debug!("Ignoring {} bytes after reply frame", buffer.len() - consumed);
                    }
                    return Ok(frame);
                }
                Decoded::NeedMoreData => continue,
                Decoded::Malformed(reason) => {
                    return Err(FingerprintError::MalformedFrame(reason));
                }
            }
        }
    }
}
