//! # Workflow Layer
//!
//! Multi-step sensor operations built on the command engine.
//!
//! This module handles:
//! - Capture-with-retry: poll for a finger up to a fixed number of attempts
//! - Identify: capture, convert into slot 1, search the library
//! - Enroll: two captures with a lift pause, register, store
//! - Template maintenance (delete, clear, count)
//!
//! This is the only layer that interprets status codes: "no finger yet"
//! is retried during capture, everything else ends the operation with an
//! outcome naming the phase. Nothing here retries a whole workflow.
//!
//! Each `.await` between phases is a cancellation point. Dropping an
//! enrollment half way leaves nothing stored; the sensor's buffers are
//! simply overwritten by the next operation.

pub mod outcome;

pub use outcome::{CaptureOutcome, EnrollOutcome, EnrollPhase, IdentifyOutcome, IdentifyPhase};

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::engine::CommandEngine;
use crate::error::{FingerprintError, Result};
use crate::packet::command::Slot;
use crate::packet::status::StatusCode;
use crate::serial::port_trait::SensorTransport;

/// Capture attempts before giving up on a finger
pub const DEFAULT_CAPTURE_ATTEMPTS: u32 = 10;

/// Pause between "no finger" answers
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Time given to lift the finger between enrollment captures
pub const DEFAULT_LIFT_PAUSE: Duration = Duration::from_millis(1000);

/// Last library location searched by default (163 templates)
pub const DEFAULT_SEARCH_END: u16 = 0x00A3;

/// Retry and range parameters for the workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub capture_attempts: u32,
    pub retry_delay: Duration,
    pub lift_pause: Duration,
    pub search_start: u16,
    pub search_end: u16,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            capture_attempts: DEFAULT_CAPTURE_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            lift_pause: DEFAULT_LIFT_PAUSE,
            search_start: 0,
            search_end: DEFAULT_SEARCH_END,
        }
    }
}

/// How far an enrollment got; lives only for one `enroll` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnrollmentProgress {
    NothingCaptured,
    FirstCaptured,
    BothCaptured,
}

/// High-level operations on one sensor session
#[derive(Debug)]
pub struct Scanner<T: SensorTransport> {
    engine: CommandEngine<T>,
    settings: WorkflowSettings,
}

impl<T: SensorTransport> Scanner<T> {
    pub fn new(engine: CommandEngine<T>, settings: WorkflowSettings) -> Self {
        Self { engine, settings }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Direct access for single commands
    pub fn engine_mut(&mut self) -> &mut CommandEngine<T> {
        &mut self.engine
    }

    pub fn into_engine(self) -> CommandEngine<T> {
        self.engine
    }

    /// Capture an image, retrying while no finger is present
    ///
    /// Issues at most `capture_attempts` capture commands. Only
    /// `NoFingerDetected` is retried, after `retry_delay`; any other
    /// status ends the loop at once.
    ///
    /// # Errors
    ///
    /// Returns error if a capture command times out or the link fails.
    pub async fn capture_with_retry(&mut self, timeout: Duration) -> Result<CaptureOutcome> {
        let attempts = self.settings.capture_attempts;

        for attempt in 1..=attempts {
            match self.engine.capture_image(timeout).await? {
                StatusCode::Ok => {
                    debug!("Image captured on attempt {}/{}", attempt, attempts);
                    return Ok(CaptureOutcome::Captured { attempts: attempt });
                }
                StatusCode::NoFingerDetected => {
                    debug!("No finger yet ({}/{})", attempt, attempts);
                    if attempt < attempts {
                        sleep(self.settings.retry_delay).await;
                    }
                }
                status => {
                    warn!("Image capture failed: {}", status);
                    return Ok(CaptureOutcome::Failed(status));
                }
            }
        }

        info!("No finger detected after {} attempts", attempts);
        Ok(CaptureOutcome::CaptureTimeout)
    }

    /// Capture a finger and look it up in the library
    ///
    /// # Arguments
    ///
    /// * `timeout` - Response timeout for each command
    ///
    /// # Returns
    ///
    /// * `Matched` - stored id and confidence
    /// * `NotFound` - search answered anything but Ok
    /// * `CaptureTimeout` - no finger within the attempt budget
    /// * `ProtocolError` - capture or conversion refused
    ///
    /// # Errors
    ///
    /// Returns `Aborted` naming the phase if a command times out, the link
    /// fails, or an Ok search reply is too short to hold a match.
    pub async fn identify(&mut self, timeout: Duration) -> Result<IdentifyOutcome> {
        info!("Place finger on the sensor");

        let capture = self
            .capture_with_retry(timeout)
            .await
            .map_err(|e| e.in_phase(IdentifyPhase::Capture.name()))?;
        match capture {
            CaptureOutcome::Captured { .. } => {}
            CaptureOutcome::CaptureTimeout => return Ok(IdentifyOutcome::CaptureTimeout),
            CaptureOutcome::Failed(status) => {
                return Ok(IdentifyOutcome::ProtocolError {
                    phase: IdentifyPhase::Capture,
                    status,
                });
            }
        }

        let status = self
            .engine
            .image_to_template(Slot::One, timeout)
            .await
            .map_err(|e| e.in_phase(IdentifyPhase::Convert.name()))?;
        if !status.is_ok() {
            warn!("Could not convert image: {}", status);
            return Ok(IdentifyOutcome::ProtocolError {
                phase: IdentifyPhase::Convert,
                status,
            });
        }

        let response = self
            .engine
            .search(Slot::One, self.settings.search_start, self.settings.search_end, timeout)
            .await
            .map_err(|e| e.in_phase(IdentifyPhase::Search.name()))?;
        if !response.is_ok() {
            info!("Fingerprint not found ({})", response.status);
            return Ok(IdentifyOutcome::NotFound);
        }

        let hit = response.search_match().ok_or_else(|| {
            FingerprintError::MalformedFrame(format!(
                "Search reply carries {} extra bytes, expected 4",
                response.extra.len()
            ))
            .in_phase(IdentifyPhase::Search.name())
        })?;

        info!("Fingerprint found: id {}, confidence {}", hit.id, hit.confidence);
        Ok(IdentifyOutcome::Matched {
            id: hit.id,
            confidence: hit.confidence,
        })
    }

    /// Enroll a finger at a library location
    ///
    /// Runs capture 1, convert 1, lift pause, capture 2, convert 2,
    /// register, store. The first refused phase ends the enrollment and
    /// is reported; register and store are only sent once both slots hold
    /// features, and store only after a successful register.
    ///
    /// # Arguments
    ///
    /// * `location` - Library location to store the model at
    /// * `timeout` - Response timeout for each command
    ///
    /// # Errors
    ///
    /// Returns `Aborted` naming the phase if a command times out or the
    /// link fails.
    pub async fn enroll(&mut self, location: u16, timeout: Duration) -> Result<EnrollOutcome> {
        info!("Enrolling fingerprint at location {}", location);
        let mut progress = EnrollmentProgress::NothingCaptured;

        info!("Place finger on the sensor");
        if let Some(outcome) = self
            .capture_into(Slot::One, EnrollPhase::CaptureFirst, EnrollPhase::ConvertFirst, timeout)
            .await?
        {
            return Ok(self.abandon(progress, outcome));
        }
        progress = EnrollmentProgress::FirstCaptured;

        info!("Lift finger");
        sleep(self.settings.lift_pause).await;

        info!("Place the same finger again");
        if let Some(outcome) = self
            .capture_into(Slot::Two, EnrollPhase::CaptureSecond, EnrollPhase::ConvertSecond, timeout)
            .await?
        {
            return Ok(self.abandon(progress, outcome));
        }
        progress = EnrollmentProgress::BothCaptured;

        let status = self
            .engine
            .register_model(timeout)
            .await
            .map_err(|e| e.in_phase(EnrollPhase::Register.name()))?;
        if !status.is_ok() {
            let outcome = EnrollOutcome::PhaseFailed {
                phase: EnrollPhase::Register,
                status,
            };
            return Ok(self.abandon(progress, outcome));
        }

        let status = self
            .engine
            .store_model(Slot::One, location, timeout)
            .await
            .map_err(|e| e.in_phase(EnrollPhase::Store.name()))?;
        if !status.is_ok() {
            let outcome = EnrollOutcome::PhaseFailed {
                phase: EnrollPhase::Store,
                status,
            };
            return Ok(self.abandon(progress, outcome));
        }

        info!("Fingerprint stored at location {}", location);
        Ok(EnrollOutcome::Stored { location })
    }

    /// Delete `count` templates starting at `location`
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the sensor answers anything but Ok.
    pub async fn delete(&mut self, location: u16, count: u16, timeout: Duration) -> Result<()> {
        let status = self.engine.delete_model(location, count, timeout).await?;
        if !status.is_ok() {
            return Err(FingerprintError::Rejected {
                command: "delete-model",
                status,
            });
        }

        info!("Deleted {} template(s) starting at location {}", count, location);
        Ok(())
    }

    /// Delete every stored template
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the sensor answers anything but Ok.
    pub async fn clear_database(&mut self, timeout: Duration) -> Result<()> {
        let status = self.engine.empty_database(timeout).await?;
        if !status.is_ok() {
            return Err(FingerprintError::Rejected {
                command: "empty-database",
                status,
            });
        }

        info!("Template library cleared");
        Ok(())
    }

    /// Number of templates stored on the sensor
    ///
    /// # Errors
    ///
    /// Returns `Rejected` on a non-Ok status, `MalformedFrame` if the
    /// reply carries no count.
    pub async fn template_count(&mut self, timeout: Duration) -> Result<u16> {
        let response = self.engine.template_count(timeout).await?;
        if !response.is_ok() {
            return Err(FingerprintError::Rejected {
                command: "template-count",
                status: response.status,
            });
        }

        response.template_count().ok_or_else(|| {
            FingerprintError::MalformedFrame("Template count reply carries no count".to_string())
        })
    }

    /// Capture and convert into `slot`; `None` once the slot holds features
    async fn capture_into(
        &mut self,
        slot: Slot,
        capture_phase: EnrollPhase,
        convert_phase: EnrollPhase,
        timeout: Duration,
    ) -> Result<Option<EnrollOutcome>> {
        let capture = self
            .capture_with_retry(timeout)
            .await
            .map_err(|e| e.in_phase(capture_phase.name()))?;
        match capture {
            CaptureOutcome::Captured { .. } => {}
            CaptureOutcome::CaptureTimeout => {
                return Ok(Some(EnrollOutcome::CaptureTimeout { phase: capture_phase }));
            }
            CaptureOutcome::Failed(status) => {
                return Ok(Some(EnrollOutcome::PhaseFailed {
                    phase: capture_phase,
                    status,
                }));
            }
        }

        let status = self
            .engine
            .image_to_template(slot, timeout)
            .await
            .map_err(|e| e.in_phase(convert_phase.name()))?;
        if !status.is_ok() {
            return Ok(Some(EnrollOutcome::PhaseFailed {
                phase: convert_phase,
                status,
            }));
        }

        Ok(None)
    }

    fn abandon(&self, progress: EnrollmentProgress, outcome: EnrollOutcome) -> EnrollOutcome {
        match outcome {
            EnrollOutcome::PhaseFailed { phase, status } => {
                warn!(
                    "Enrollment failed at {} ({}) with {:?}: {}",
                    phase,
                    status,
                    progress,
                    phase.remediation()
                );
            }
            EnrollOutcome::CaptureTimeout { phase } => {
                warn!("Enrollment abandoned at {}: no finger detected", phase);
            }
            EnrollOutcome::Stored { .. } => {}
        }
        outcome
    }
}
