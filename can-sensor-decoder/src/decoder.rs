//! Frame decoder API
//!
//! This module provides the primary interface for turning raw bus frames into
//! channel readings. Decoding is pure: the decoder never touches the store,
//! the caller writes the returned readings.

use crate::config::DecoderConfig;
use crate::message_decoder::MessageDecoder;
use crate::signals::{builtin, IdentifierMapping, MappingStats};
use crate::types::{CanFrame, Decoded, Reading, Result};

/// The frame decoder - entry point for all decoding operations
pub struct FrameDecoder {
    /// Identifier -> channel descriptors
    mapping: IdentifierMapping,
    config: DecoderConfig,
}

impl FrameDecoder {
    /// Create a decoder over the built-in channel table
    pub fn new(config: DecoderConfig) -> Result<Self> {
        Ok(Self::with_mapping(builtin::mapping()?, config))
    }

    /// Create a decoder over a custom identifier mapping
    pub fn with_mapping(mapping: IdentifierMapping, config: DecoderConfig) -> Self {
        log::debug!(
            "Frame decoder ready: {} ids, {} channels, {:?} identifiers",
            mapping.stats().num_ids,
            mapping.stats().num_channels,
            config.id_width
        );
        Self { mapping, config }
    }

    /// Decode a frame into channel readings
    ///
    /// 1. Mask the identifier to the configured width and look it up
    /// 2. Skip every mapped channel whose minimum payload length is not met
    /// 3. Scale the raw value of each remaining channel
    ///
    /// Unmapped identifiers and frames where no channel decodes return
    /// [`Decoded::Ignored`]. This is the common case on a shared bus.
    ///
    /// # Example
    /// ```
    /// use can_sensor_decoder::{CanFrame, Channel, DecoderConfig, FrameDecoder};
    ///
    /// let decoder = FrameDecoder::new(DecoderConfig::new()).unwrap();
    /// let decoded = decoder.decode(&CanFrame::new(0x1A0, &[0x57, 0x03]));
    /// assert_eq!(decoded.value_of(Channel::EngineTemp), Some(85.5));
    /// ```
    pub fn decode(&self, frame: &CanFrame) -> Decoded {
        let can_id = self.config.mask_id(frame.can_id);

        if !self.config.should_process_message(can_id) {
            return Decoded::Ignored;
        }

        let Some(descriptors) = self.mapping.get(can_id) else {
            log::trace!("Unknown CAN ID: 0x{:X}, ignoring", can_id);
            return Decoded::Ignored;
        };

        let readings: Vec<Reading> = descriptors
            .iter()
            .filter_map(|descriptor| {
                MessageDecoder::decode_value(&frame.data, descriptor)
                    .map(|value| Reading::new(descriptor.channel, value))
            })
            .collect();

        if readings.is_empty() {
            log::debug!(
                "Frame 0x{:X} too short ({} bytes), ignoring",
                can_id,
                frame.dlc()
            );
            return Decoded::Ignored;
        }

        for reading in &readings {
            log::debug!("Decoded 0x{:X}: {} = {:.1}", can_id, reading.channel.key(), reading.value);
        }

        Decoded::Readings(readings)
    }

    /// Identifier mapping in use
    pub fn mapping(&self) -> &IdentifierMapping {
        &self.mapping
    }

    /// Decoder configuration in use
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Get statistics about the loaded mapping
    pub fn mapping_stats(&self) -> MappingStats {
        self.mapping.stats()
    }
}
