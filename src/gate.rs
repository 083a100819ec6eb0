//! # Sensor Gate
//!
//! Shares one [`Scanner`] between tasks.
//!
//! The wire protocol has no request id, so two command sequences must never
//! interleave on the link. Every gate method holds the lock for the whole
//! workflow, including its retry and lift-pause sleeps. Those sleeps yield
//! to the runtime, so unrelated tasks keep running; only other sensor
//! callers wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::serial::port_trait::SensorTransport;
use crate::workflow::{EnrollOutcome, IdentifyOutcome, Scanner};

/// Cloneable handle serializing access to one scanner
pub struct SensorGate<T: SensorTransport> {
    inner: Arc<Mutex<Scanner<T>>>,
}

impl<T: SensorTransport> Clone for SensorGate<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: SensorTransport> SensorGate<T> {
    pub fn new(scanner: Scanner<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(scanner)),
        }
    }

    /// Hold the sensor for a custom command sequence
    pub async fn lock(&self) -> MutexGuard<'_, Scanner<T>> {
        self.inner.lock().await
    }

    pub async fn identify(&self, timeout: Duration) -> Result<IdentifyOutcome> {
        self.inner.lock().await.identify(timeout).await
    }

    pub async fn enroll(&self, location: u16, timeout: Duration) -> Result<EnrollOutcome> {
        self.inner.lock().await.enroll(location, timeout).await
    }

    pub async fn delete(&self, location: u16, count: u16, timeout: Duration) -> Result<()> {
        self.inner.lock().await.delete(location, count, timeout).await
    }

    pub async fn clear_database(&self, timeout: Duration) -> Result<()> {
        self.inner.lock().await.clear_database(timeout).await
    }

    pub async fn template_count(&self, timeout: Duration) -> Result<u16> {
        self.inner.lock().await.template_count(timeout).await
    }
}
