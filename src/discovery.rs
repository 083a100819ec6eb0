//! # Device Discovery
//!
//! Finds the sensor by trying an ordered list of link configurations and
//! keeping the first one that passes the password handshake.
//!
//! Discovery runs once. If nothing answers it fails with `NoDeviceFound`
//! and the caller decides when to try again (typically after the sensor
//! has been power-cycled or re-plugged).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::engine::{CommandEngine, Credentials, Session};
use crate::error::{FingerprintError, Result};
use crate::serial::port_trait::SensorTransport;

/// One serial configuration to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Device path (e.g., /dev/ttyUSB0)
    pub port: String,

    /// Line speed
    pub baud_rate: u32,
}

impl LinkCandidate {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
        }
    }
}

impl fmt::Display for LinkCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} baud", self.port, self.baud_rate)
    }
}

/// Opens a transport for a candidate link
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open the link; no bytes are exchanged yet
    async fn open(&self, candidate: &LinkCandidate) -> Result<Box<dyn SensorTransport>>;
}

/// Try each candidate in order and return an authenticated engine
///
/// # Arguments
///
/// * `connector` - Opens the transport for each candidate
/// * `candidates` - Link configurations, in order of preference
/// * `credentials` - Address and password for the handshake
/// * `timeout` - Handshake response timeout per candidate
///
/// # Returns
///
/// * `Result<CommandEngine<Box<dyn SensorTransport>>>` - Engine bound to the
///   first candidate that authenticated. Later candidates are never opened.
///
/// # Errors
///
/// Returns `NoDeviceFound` listing every candidate tried if none
/// authenticated (including an empty candidate list).
pub async fn discover<C>(
    connector: &C,
    candidates: &[LinkCandidate],
    credentials: Credentials,
    timeout: Duration,
) -> Result<CommandEngine<Box<dyn SensorTransport>>>
where
    C: Connector + ?Sized,
{
    for candidate in candidates {
        debug!("Trying sensor link {}", candidate);

        let transport = match connector.open(candidate).await {
            Ok(transport) => transport,
            Err(e) => {
                warn!("Failed to open {}: {}", candidate, e);
                continue;
            }
        };

        let session = Session {
            credentials,
            link: candidate.clone(),
        };
        let mut engine = CommandEngine::new(transport, session);

        if engine.verify_password(timeout).await {
            info!("Fingerprint sensor found on {}", candidate);
            return Ok(engine);
        }
    }

    let tried = candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(FingerprintError::NoDeviceFound(tried))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::command::opcode;
    use crate::packet::status::StatusCode;
    use crate::serial::port_trait::mocks::ScriptedSensor;
    use mockall::Sequence;

    const TIMEOUT: Duration = Duration::from_millis(1000);

    fn candidates() -> Vec<LinkCandidate> {
        vec![
            LinkCandidate::new("A", 57_600),
            LinkCandidate::new("B", 57_600),
            LinkCandidate::new("C", 57_600),
        ]
    }

    fn answering(status: StatusCode) -> ScriptedSensor {
        ScriptedSensor::new().status_always(opcode::VERIFY_PASSWORD, status)
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_authenticated_candidate() {
        let sensor_a = answering(StatusCode::PasswordFailed);
        let sensor_b = answering(StatusCode::Ok);

        let mut connector = MockConnector::new();
        let mut seq = Sequence::new();

        let a = sensor_a.clone();
        connector
            .expect_open()
            .withf(|candidate| candidate.port == "A")
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Box::new(a.clone()) as Box<dyn SensorTransport>));
        let b = sensor_b.clone();
        connector
            .expect_open()
            .withf(|candidate| candidate.port == "B")
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Box::new(b.clone()) as Box<dyn SensorTransport>));
        connector
            .expect_open()
            .withf(|candidate| candidate.port == "C")
            .times(0);

        let engine = discover(&connector, &candidates(), Credentials::default(), TIMEOUT)
            .await
            .unwrap();

        assert_eq!(engine.session().link.port, "B");
        assert_eq!(sensor_a.count(opcode::VERIFY_PASSWORD), 1);
        assert_eq!(sensor_b.count(opcode::VERIFY_PASSWORD), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_failure_moves_to_next_candidate() {
        let mut connector = MockConnector::new();
        connector
            .expect_open()
            .withf(|candidate| candidate.port == "A")
            .times(1)
            .returning(|candidate| {
                Err(FingerprintError::Serial(format!("Failed to open {}", candidate.port)))
            });
        connector
            .expect_open()
            .withf(|candidate| candidate.port == "B")
            .times(1)
            .returning(|_| Ok(Box::new(answering(StatusCode::Ok)) as Box<dyn SensorTransport>));
        connector
            .expect_open()
            .withf(|candidate| candidate.port == "C")
            .times(0);

        let engine = discover(&connector, &candidates(), Credentials::default(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(engine.session().link, LinkCandidate::new("B", 57_600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_candidates_exhaust_to_no_device_found() {
        let mut connector = MockConnector::new();
        connector
            .expect_open()
            .times(3)
            .returning(|_| Ok(Box::new(ScriptedSensor::new()) as Box<dyn SensorTransport>));

        let result = discover(&connector, &candidates(), Credentials::default(), TIMEOUT).await;

        match result {
            Err(FingerprintError::NoDeviceFound(tried)) => {
                assert_eq!(tried, "A @ 57600 baud, B @ 57600 baud, C @ 57600 baud");
            }
            other => panic!("Expected NoDeviceFound, got: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_candidate_list() {
        let connector = MockConnector::new();
        let result = discover(&connector, &[], Credentials::default(), TIMEOUT).await;
        assert!(matches!(result, Err(FingerprintError::NoDeviceFound(_))));
    }

    #[test]
    fn test_candidate_display() {
        assert_eq!(
            LinkCandidate::new("/dev/ttyUSB0", 57_600).to_string(),
            "/dev/ttyUSB0 @ 57600 baud"
        );
    }
}
