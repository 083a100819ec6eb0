//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) gives a
//! working setup for a sensor on one of the usual USB adapters.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::discovery::LinkCandidate;
use crate::engine::Credentials;
use crate::error::{FingerprintError, Result};
use crate::monitor::MonitorSettings;
use crate::serial::{default_candidates, DEFAULT_BAUD_RATE};
use crate::workflow::WorkflowSettings;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial link configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SerialConfig {
    /// Per-command response timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Ordered discovery list; empty means the built-in device paths
    #[serde(default)]
    pub candidates: Vec<CandidateConfig>,
}

/// One `[[serial.candidates]]` entry
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CandidateConfig {
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Sensor identity and search range
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SensorConfig {
    #[serde(default = "default_address")]
    pub address: u32,

    #[serde(default)]
    pub password: u32,

    #[serde(default)]
    pub search_start: u16,

    #[serde(default = "default_search_end")]
    pub search_end: u16,

    /// Reject responses whose checksum does not verify
    #[serde(default)]
    pub strict_checksum: bool,
}

/// Capture retry and enrollment pacing
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WorkflowConfig {
    #[serde(default = "default_capture_attempts")]
    pub capture_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_lift_pause_ms")]
    pub lift_pause_ms: u64,
}

/// Access monitor configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MonitorConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_alarm_after")]
    pub alarm_after: u32,

    /// JSONL file for access events; empty disables it
    #[serde(default)]
    pub access_log: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily log files; empty logs to stderr only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_timeout_ms() -> u64 { 3000 }
fn default_baud_rate() -> u32 { DEFAULT_BAUD_RATE }

fn default_address() -> u32 { 0xFFFF_FFFF }
fn default_search_end() -> u16 { 0x00A3 }

fn default_capture_attempts() -> u32 { 10 }
fn default_retry_delay_ms() -> u64 { 500 }
fn default_lift_pause_ms() -> u64 { 1000 }

fn default_interval_ms() -> u64 { 200 }
fn default_alarm_after() -> u32 { 4 }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            candidates: Vec::new(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            password: 0,
            search_start: 0,
            search_end: default_search_end(),
            strict_checksum: false,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            capture_attempts: default_capture_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            lift_pause_ms: default_lift_pause_ms(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            alarm_after: default_alarm_after(),
            access_log: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> FingerprintError {
    FingerprintError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use zfm_fingerprint::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        for candidate in &self.serial.candidates {
            if candidate.port.is_empty() {
                return Err(invalid("candidate port cannot be empty"));
            }

            // The sensor only accepts multiples of 9600 up to 115200
            let baud = candidate.baud_rate;
            if baud == 0 || baud % 9600 != 0 || baud / 9600 > 12 {
                return Err(invalid(format!(
                    "baud_rate {} for {} must be 9600 * n with n between 1 and 12",
                    baud, candidate.port
                )));
            }
        }

        if self.sensor.search_start > self.sensor.search_end {
            return Err(invalid("search_start must not be greater than search_end"));
        }

        if self.workflow.capture_attempts == 0 || self.workflow.capture_attempts > 100 {
            return Err(invalid("capture_attempts must be between 1 and 100"));
        }

        if self.monitor.interval_ms == 0 {
            return Err(invalid("monitor interval_ms must be greater than 0"));
        }

        if self.monitor.alarm_after == 0 {
            return Err(invalid("alarm_after must be greater than 0"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        Ok(())
    }

    /// Discovery candidates in order, falling back to the built-in list
    pub fn candidates(&self) -> Vec<LinkCandidate> {
        if self.serial.candidates.is_empty() {
            return default_candidates();
        }
        self.serial
            .candidates
            .iter()
            .map(|c| LinkCandidate::new(c.port.clone(), c.baud_rate))
            .collect()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            address: self.sensor.address,
            password: self.sensor.password,
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.serial.timeout_ms)
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            capture_attempts: self.workflow.capture_attempts,
            retry_delay: Duration::from_millis(self.workflow.retry_delay_ms),
            lift_pause: Duration::from_millis(self.workflow.lift_pause_ms),
            search_start: self.sensor.search_start,
            search_end: self.sensor.search_end,
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_millis(self.monitor.interval_ms),
            alarm_after: self.monitor.alarm_after,
            command_timeout: self.command_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> Config {
        let mut config = Config::default();
        config.serial.candidates = vec![CandidateConfig {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 57_600,
        }];
        config
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.timeout_ms, 3000);
        assert_eq!(config.sensor.address, 0xFFFF_FFFF);
        assert_eq!(config.sensor.password, 0);
        assert_eq!(config.sensor.search_end, 163);
        assert!(!config.sensor.strict_checksum);
        assert_eq!(config.workflow.capture_attempts, 10);
        assert_eq!(config.monitor.alarm_after, 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_file_matches_defaults() {
        let temp_file = write_config("");
        assert_eq!(Config::load(temp_file.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[serial]
timeout_ms = 1500

[[serial.candidates]]
port = "/dev/ttyAMA0"
baud_rate = 115200

[[serial.candidates]]
port = "/dev/ttyUSB3"

[sensor]
address = 0x12345678
password = 42
search_end = 99
strict_checksum = true

[workflow]
capture_attempts = 5

[monitor]
alarm_after = 3
access_log = "/var/log/door.jsonl"

[logging]
level = "debug"
"#;

        let temp_file = write_config(toml_content);
        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(
            config.candidates(),
            vec![
                LinkCandidate::new("/dev/ttyAMA0", 115_200),
                LinkCandidate::new("/dev/ttyUSB3", 57_600),
            ]
        );
        assert_eq!(
            config.credentials(),
            Credentials {
                address: 0x1234_5678,
                password: 42
            }
        );
        assert_eq!(config.command_timeout(), Duration::from_millis(1500));
        assert!(config.sensor.strict_checksum);
        assert_eq!(config.monitor.access_log, "/var/log/door.jsonl");

        let settings = config.workflow_settings();
        assert_eq!(settings.capture_attempts, 5);
        assert_eq!(settings.retry_delay, Duration::from_millis(500));
        assert_eq!(settings.search_end, 99);

        assert_eq!(config.monitor_settings().alarm_after, 3);
    }

    #[test]
    fn test_shipped_default_file() {
        let config = Config::from_toml(include_str!("../config/default.toml")).unwrap();
        assert_eq!(config.sensor, SensorConfig::default());
        assert_eq!(config.workflow, WorkflowConfig::default());
        assert_eq!(config.monitor, MonitorConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.serial.timeout_ms, default_timeout_ms());

        // Listed candidates all come from the built-in list
        let builtin = default_candidates();
        let listed = config.candidates();
        assert_eq!(listed.len(), 2);
        let mut positions = listed.iter().map(|c| builtin.iter().position(|b| b == c));
        assert!(positions.all(|p| p.is_some()));
    }

    #[test]
    fn test_unreadable_file() {
        assert!(matches!(
            Config::load("/nonexistent/zfm.toml"),
            Err(FingerprintError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Config::from_toml("[serial\ntimeout_ms = "),
            Err(FingerprintError::Config(_))
        ));
    }

    #[test]
    fn test_default_candidates_when_none_configured() {
        let config = Config::default();
        let candidates = config.candidates();
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], LinkCandidate::new("/dev/ttyUSB0", 57_600));
    }

    #[test]
    fn test_timeout_ms_zero() {
        let mut config = create_valid_config();
        config.serial.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_ms_too_high() {
        let mut config = create_valid_config();
        config.serial.timeout_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_candidate_port() {
        let mut config = create_valid_config();
        config.serial.candidates[0].port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rates() {
        for &baud in &[0, 4800, 57_601, 124_800, 921_600] {
            let mut config = create_valid_config();
            config.serial.candidates[0].baud_rate = baud;
            assert!(config.validate().is_err(), "Baud rate {} should be invalid", baud);
        }
    }

    #[test]
    fn test_valid_baud_rates() {
        for n in 1..=12 {
            let mut config = create_valid_config();
            config.serial.candidates[0].baud_rate = 9600 * n;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", 9600 * n);
        }
    }

    #[test]
    fn test_search_range_inverted() {
        let mut config = create_valid_config();
        config.sensor.search_start = 10;
        config.sensor.search_end = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_slot_search_range() {
        let mut config = create_valid_config();
        config.sensor.search_start = 7;
        config.sensor.search_end = 7;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capture_attempts_zero() {
        let mut config = create_valid_config();
        config.workflow.capture_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capture_attempts_too_high() {
        let mut config = create_valid_config();
        config.workflow.capture_attempts = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_alarm_after_zero() {
        let mut config = create_valid_config();
        config.monitor.alarm_after = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_interval_zero() {
        let mut config = create_valid_config();
        config.monitor.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_error_from_file() {
        let temp_file = write_config("[workflow]\ncapture_attempts = 0\n");
        let err = Config::load(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("capture_attempts"));
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_timeout_ms(), 3000);
        assert_eq!(default_baud_rate(), 57_600);
        assert_eq!(default_address(), 0xFFFF_FFFF);
        assert_eq!(default_search_end(), 163);
        assert_eq!(default_capture_attempts(), 10);
        assert_eq!(default_retry_delay_ms(), 500);
        assert_eq!(default_lift_pause_ms(), 1000);
        assert_eq!(default_interval_ms(), 200);
        assert_eq!(default_alarm_after(), 4);
        assert_eq!(default_log_level(), "info");
    }
}
