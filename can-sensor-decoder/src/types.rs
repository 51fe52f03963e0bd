//! Core types for the CAN sensor decoder library
//!
//! This module defines the raw frame the bus layer hands to the decoder, the
//! readings the decoder emits, and the library-wide error type. Unmapped
//! identifiers and short payloads are normal bus traffic and are never
//! represented as errors.

use crate::channel::Channel;
use chrono::{DateTime, Local};
use std::fmt;

/// Timestamp type used for persisted records
pub type Timestamp = DateTime<Local>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Maximum payload length of a classic CAN frame
pub const MAX_PAYLOAD_LEN: usize = 8;

/// Raw CAN frame as read from a bus or a replay log
///
/// This represents one bus message before any channel resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// Wire identifier (11-bit or 29-bit, flag bits may still be set)
    pub can_id: u32,
    /// Frame data bytes (0-8 bytes)
    pub data: Vec<u8>,
    /// True if this is an extended (29-bit) CAN ID
    pub is_extended: bool,
}

impl CanFrame {
    /// Create a standard (11-bit) frame
    ///
    /// Payloads longer than 8 bytes are truncated to the classic CAN limit.
    pub fn new(can_id: u32, data: &[u8]) -> Self {
        let len = data.len().min(MAX_PAYLOAD_LEN);
        Self {
            can_id,
            data: data[..len].to_vec(),
            is_extended: false,
        }
    }

    /// Create an extended (29-bit) frame
    pub fn new_extended(can_id: u32, data: &[u8]) -> Self {
        Self {
            is_extended: true,
            ..Self::new(can_id, data)
        }
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extended {
            write!(f, "0x{:08X} [{}]", self.can_id, self.dlc())?;
        } else {
            write!(f, "0x{:03X} [{}]", self.can_id, self.dlc())?;
        }
        for byte in &self.data {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}

/// One decoded physical value for one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub channel: Channel,
    pub value: f64,
}

impl Reading {
    pub fn new(channel: Channel, value: f64) -> Self {
        Self { channel, value }
    }
}

/// Outcome of decoding one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The identifier is not mapped, or no mapped channel had enough payload
    Ignored,
    /// One reading per mapped channel whose payload requirement was met
    Readings(Vec<Reading>),
}

impl Decoded {
    /// True if the frame produced no readings
    pub fn is_ignored(&self) -> bool {
        matches!(self, Decoded::Ignored)
    }

    /// Decoded readings (empty when ignored)
    pub fn readings(&self) -> &[Reading] {
        match self {
            Decoded::Ignored => &[],
            Decoded::Readings(readings) => readings,
        }
    }

    /// Value decoded for a specific channel, if any
    pub fn value_of(&self, channel: Channel) -> Option<f64> {
        self.readings()
            .iter()
            .find(|r| r.channel == channel)
            .map(|r| r.value)
    }
}

/// Errors that can occur in the decoder library
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Invalid channel descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Bus read failed: {0}")]
    BusError(String),

    #[error("Failed to parse replay log at line {line}: {reason}")]
    ReplayParseError { line: usize, reason: String },

    #[error("Persistence failed: {0}")]
    PersistenceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
