//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library.
//! Source selection, persistence and display settings live in the application.

use serde::{Deserialize, Serialize};

/// Standard (11-bit) identifier mask
pub const CAN_SFF_MASK: u32 = 0x0000_07FF;
/// Extended (29-bit) identifier mask
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

/// Address width used when resolving a frame identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdWidth {
    /// 11-bit identifiers
    Standard,
    /// 29-bit identifiers
    #[default]
    Extended,
}

impl IdWidth {
    /// Mask applied to the raw identifier before lookup
    pub fn mask(self) -> u32 {
        match self {
            IdWidth::Standard => CAN_SFF_MASK,
            IdWidth::Extended => CAN_EFF_MASK,
        }
    }
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Identifier width convention of the bus in use
    #[serde(default)]
    pub id_width: IdWidth,

    /// Optional: only decode these specific (masked) CAN IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the identifier width
    pub fn with_id_width(mut self, id_width: IdWidth) -> Self {
        self.id_width = id_width;
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Mask a raw identifier to the configured width
    pub fn mask_id(&self, can_id: u32) -> u32 {
        can_id & self.id_width.mask()
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_extended() {
        let config = DecoderConfig::new();
        assert_eq!(config.id_width, IdWidth::Extended);
        // EFF flag bit is stripped, identifier bits are kept
        assert_eq!(config.mask_id(0x8000_01A0), 0x1A0);
        assert_eq!(config.mask_id(0x18FF_0001), 0x18FF_0001);
    }

    #[test]
    fn test_standard_mask() {
        let config = DecoderConfig::new().with_id_width(IdWidth::Standard);
        assert_eq!(config.mask_id(0x1A0), 0x1A0);
        assert_eq!(config.mask_id(0x0000_09A0), 0x1A0);
    }

    #[test]
    fn test_filter_logic() {
        let config = DecoderConfig::new().with_message_filter(vec![0x1A0, 0xA2]);

        assert!(config.should_process_message(0x1A0));
        assert!(config.should_process_message(0xA2));
        assert!(!config.should_process_message(0xA5));
    }

    #[test]
    fn test_no_filters() {
        let config = DecoderConfig::new();
        assert!(config.should_process_message(0x123));
        assert!(config.should_process_message(0x1FFF_FFFF));
    }

    #[test]
    fn test_deserialize_lowercase_width() {
        let config: DecoderConfig = serde_json::from_str(r#"{"id_width":"standard"}"#).unwrap();
        assert_eq!(config.id_width, IdWidth::Standard);
        assert!(config.message_filter.is_none());
    }
}
