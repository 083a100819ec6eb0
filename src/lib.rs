//! # ZFM Fingerprint Library
//!
//! Drive ZFM/AS608-class optical fingerprint sensors over a serial port.
//!
//! The layers, bottom up:
//! - [`packet`]: frame codec and command catalog
//! - [`engine`]: one command out, one response back, with a timeout
//! - [`discovery`]: find the link the sensor answers on
//! - [`workflow`]: capture-with-retry, identify, enroll
//! - [`gate`] and [`monitor`]: shared access and the access-control loop

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod gate;
pub mod monitor;
pub mod packet;
pub mod serial;
pub mod workflow;
