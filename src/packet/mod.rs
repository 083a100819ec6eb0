//! # Packet Protocol Module
//!
//! Implementation of the ZFM/AS608 fingerprint sensor packet protocol.
//!
//! This module handles:
//! - Frame encoding (start marker, address, kind, length, payload, checksum)
//! - Incremental frame decoding from accumulated serial bytes
//! - 16-bit additive checksum calculation
//! - The command opcode catalog and status code enumeration

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod checksum;
pub mod command;
pub mod status;
