//! # Access Monitor
//!
//! Watches the sensor for fingers and decides who gets in.
//!
//! This module handles:
//! - Running identify on a fixed interval through the [`SensorGate`]
//! - Counting consecutive rejections and raising an alarm at a threshold
//! - Writing access events to a JSONL log (optional)
//!
//! A capture timeout means nobody touched the sensor; it neither grants
//! nor rejects and leaves the rejection count alone.

pub mod access_log;

use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::gate::SensorGate;
use crate::serial::port_trait::SensorTransport;
use crate::workflow::IdentifyOutcome;
use access_log::AccessLog;

/// Default pause between identification rounds
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Default consecutive rejections before the alarm
pub const DEFAULT_ALARM_AFTER: u32 = 4;

/// Something worth recording at the door
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AccessEvent {
    /// Known finger
    Granted { id: u16, confidence: u16 },

    /// Unknown finger, below the alarm threshold
    Rejected { consecutive: u32 },

    /// Threshold of consecutive unknown fingers reached
    Alarm { rejections: u32 },

    /// Sensor refused a capture or conversion
    Fault { phase: String, status: String },

    /// The link to the sensor misbehaved
    LinkError { message: String },
}

/// Consecutive-rejection counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionCounter {
    alarm_after: u32,
    consecutive: u32,
}

impl RejectionCounter {
    pub fn new(alarm_after: u32) -> Self {
        Self {
            alarm_after: alarm_after.max(1),
            consecutive: 0,
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Turn one identify outcome into an event
    ///
    /// A match resets the count. Reaching the threshold raises the alarm
    /// and starts counting again from zero.
    pub fn observe(&mut self, outcome: &IdentifyOutcome) -> Option<AccessEvent> {
        match *outcome {
            IdentifyOutcome::Matched { id, confidence } => {
                self.consecutive = 0;
                Some(AccessEvent::Granted { id, confidence })
            }
            IdentifyOutcome::NotFound => {
                self.consecutive += 1;
                if self.consecutive >= self.alarm_after {
                    let rejections = self.consecutive;
                    self.consecutive = 0;
                    Some(AccessEvent::Alarm { rejections })
                } else {
                    Some(AccessEvent::Rejected {
                        consecutive: self.consecutive,
                    })
                }
            }
            IdentifyOutcome::CaptureTimeout => None,
            IdentifyOutcome::ProtocolError { phase, status } => Some(AccessEvent::Fault {
                phase: phase.to_string(),
                status: status.to_string(),
            }),
        }
    }
}

/// Timing for the monitor loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub alarm_after: u32,
    pub command_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            alarm_after: DEFAULT_ALARM_AFTER,
            command_timeout: Duration::from_millis(3000),
        }
    }
}

/// Identification loop for an access point
pub struct AccessMonitor<T: SensorTransport> {
    gate: SensorGate<T>,
    settings: MonitorSettings,
    counter: RejectionCounter,
    log: Option<AccessLog>,
}

impl<T: SensorTransport> AccessMonitor<T> {
    pub fn new(gate: SensorGate<T>, settings: MonitorSettings) -> Self {
        Self {
            gate,
            settings,
            counter: RejectionCounter::new(settings.alarm_after),
            log: None,
        }
    }

    /// Also append every event to `log`
    pub fn with_access_log(mut self, log: AccessLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn consecutive_rejections(&self) -> u32 {
        self.counter.consecutive()
    }

    /// Run one identification round
    ///
    /// Link errors are reported as events, not returned; the loop keeps
    /// going and the next round starts with a fresh command.
    pub async fn poll(&mut self) -> Option<AccessEvent> {
        let event = match self.gate.identify(self.settings.command_timeout).await {
            Ok(outcome) => self.counter.observe(&outcome),
            Err(e) => Some(AccessEvent::LinkError {
                message: e.to_string(),
            }),
        };

        if let Some(event) = &event {
            self.report(event);
        }
        event
    }

    /// Poll forever; cancel by dropping the future
    pub async fn run(&mut self) {
        info!(
            "Watching for fingers every {} ms (alarm after {} rejections)",
            self.settings.interval.as_millis(),
            self.settings.alarm_after
        );

        loop {
            self.poll().await;
            sleep(self.settings.interval).await;
        }
    }

    fn report(&mut self, event: &AccessEvent) {
        match event {
            AccessEvent::Granted { id, confidence } => {
                info!("Welcome, user {} (confidence {})", id, confidence);
            }
            AccessEvent::Rejected { consecutive } => {
                info!("Fingerprint rejected ({} in a row)", consecutive);
            }
            AccessEvent::Alarm { rejections } => {
                warn!("ALARM: {} consecutive unknown fingerprints", rejections);
            }
            AccessEvent::Fault { phase, status } => {
                warn!("Sensor fault during {}: {}", phase, status);
            }
            AccessEvent::LinkError { message } => {
                warn!("Identification failed: {}", message);
            }
        }

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.append(event) {
                warn!("Failed to write access log {}: {}", log.path().display(), e);
            }
        }
    }
}
