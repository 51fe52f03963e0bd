//! Identifier mapping
//!
//! Maps wire identifiers to the channel descriptors that describe how each
//! channel is laid out in the frame payload. Read-only once built.

use crate::channel::Channel;
use crate::config::CAN_EFF_MASK;
use crate::types::{DecoderError, Result, MAX_PAYLOAD_LEN};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Byte order for value extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for raw integer interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Two's complement signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

/// Layout of one channel inside a frame payload
///
/// Physical value = raw / scale + bias.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    /// Channel this descriptor decodes
    pub channel: Channel,
    /// Wire identifier carrying the channel (already masked)
    pub can_id: u32,
    /// Byte offset of the value in the payload
    pub offset: usize,
    /// Width of the value in bytes (1, 2, 4 or 8)
    pub width: usize,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    /// Divisor applied to the raw integer
    pub scale: f64,
    /// Added after scaling
    pub bias: f64,
    /// Minimum payload length for the frame to be considered complete
    pub min_len: usize,
    /// Bits kept from an unsigned raw value before scaling
    #[serde(default)]
    pub mask: Option<u64>,
}

impl ChannelDescriptor {
    /// Little-endian descriptor with no bias whose minimum length is the end of the value
    pub fn new(channel: Channel, can_id: u32, offset: usize, width: usize, value_type: ValueType, scale: f64) -> Self {
        Self {
            channel,
            can_id,
            offset,
            width,
            byte_order: ByteOrder::LittleEndian,
            value_type,
            scale,
            bias: 0.0,
            min_len: offset + width,
            mask: None,
        }
    }

    /// Builder method: set byte order
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Builder method: set bias
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Builder method: require a longer payload than the value itself needs
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// Builder method: keep only the given bits of the raw value
    pub fn with_mask(mut self, mask: u64) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Check the descriptor can be decoded safely
    pub fn validate(&self) -> Result<()> {
        if self.can_id > CAN_EFF_MASK {
            return Err(DecoderError::InvalidDescriptor(format!(
                "{}: CAN ID 0x{:X} exceeds 29 bits",
                self.channel.key(),
                self.can_id
            )));
        }
        if !matches!(self.width, 1 | 2 | 4 | 8) {
            return Err(DecoderError::InvalidDescriptor(format!(
                "{}: unsupported width {} bytes",
                self.channel.key(),
                self.width
            )));
        }
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(DecoderError::InvalidDescriptor(format!(
                "{}: scale must be finite and non-zero",
                self.channel.key()
            )));
        }
        if !self.bias.is_finite() {
            return Err(DecoderError::InvalidDescriptor(format!(
                "{}: bias must be finite",
                self.channel.key()
            )));
        }
        if self.offset + self.width > self.min_len || self.min_len > MAX_PAYLOAD_LEN {
            return Err(DecoderError::InvalidDescriptor(format!(
                "{}: value bytes {}..{} do not fit minimum length {} (max {})",
                self.channel.key(),
                self.offset,
                self.offset + self.width,
                self.min_len,
                MAX_PAYLOAD_LEN
            )));
        }
        if let Some(mask) = self.mask {
            let value_bits = u64::MAX >> (64 - 8 * self.width);
            if self.value_type != ValueType::Unsigned || mask == 0 || mask & !value_bits != 0 {
                return Err(DecoderError::InvalidDescriptor(format!(
                    "{}: mask 0x{:X} needs an unsigned value of {} bytes with those bits",
                    self.channel.key(),
                    mask,
                    self.width
                )));
            }
        }
        Ok(())
    }
}

/// The identifier mapping
pub struct IdentifierMapping {
    /// Key: masked CAN ID, Value: descriptors carried by that ID in payload order
    by_id: HashMap<u32, Vec<ChannelDescriptor>>,

    /// Reverse lookup: channel -> CAN ID
    by_channel: HashMap<Channel, u32>,
}

impl IdentifierMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_channel: HashMap::new(),
        }
    }

    /// Build a mapping from a list of descriptors
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ChannelDescriptor>) -> Result<Self> {
        let mut mapping = Self::new();
        for descriptor in descriptors {
            mapping.add_descriptor(descriptor)?;
        }
        Ok(mapping)
    }

    /// Add a descriptor to the mapping
    ///
    /// A channel may be mapped only once.
    pub fn add_descriptor(&mut self, descriptor: ChannelDescriptor) -> Result<()> {
        descriptor.validate()?;

        if let Some(existing) = self.by_channel.get(&descriptor.channel) {
            return Err(DecoderError::InvalidDescriptor(format!(
                "{} is already mapped to CAN ID 0x{:X}",
                descriptor.channel.key(),
                existing
            )));
        }

        self.by_channel.insert(descriptor.channel, descriptor.can_id);
        let descriptors = self.by_id.entry(descriptor.can_id).or_default();
        descriptors.push(descriptor);
        descriptors.sort_by_key(|d| d.offset);
        Ok(())
    }

    /// Get the descriptors for a CAN ID
    pub fn get(&self, can_id: u32) -> Option<&[ChannelDescriptor]> {
        self.by_id.get(&can_id).map(Vec::as_slice)
    }

    /// Get the descriptor of a channel
    pub fn descriptor(&self, channel: Channel) -> Option<&ChannelDescriptor> {
        let can_id = self.by_channel.get(&channel)?;
        self.by_id
            .get(can_id)
            .and_then(|descriptors| descriptors.iter().find(|d| d.channel == channel))
    }

    /// Get all mapped CAN IDs, sorted
    pub fn can_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get mapping statistics
    pub fn stats(&self) -> MappingStats {
        MappingStats {
            num_ids: self.by_id.len(),
            num_channels: self.by_channel.len(),
        }
    }
}

impl Default for IdentifierMapping {
    fn default() -> Self {
        Self::new()
    }
}

/// Mapping statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingStats {
    /// Number of distinct wire identifiers
    pub num_ids: usize,
    /// Number of mapped channels
    pub num_channels: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_temp() -> ChannelDescriptor {
        ChannelDescriptor::new(Channel::EngineTemp, 0x1A0, 0, 2, ValueType::Signed, 10.0)
    }

    #[test]
    fn test_empty_mapping() {
        let mapping = IdentifierMapping::new();
        let stats = mapping.stats();
        assert_eq!(stats.num_ids, 0);
        assert_eq!(stats.num_channels, 0);
        assert!(mapping.get(0x1A0).is_none());
    }

    #[test]
    fn test_add_descriptor() {
        let mut mapping = IdentifierMapping::new();
        mapping.add_descriptor(engine_temp()).unwrap();

        let found = mapping.get(0x1A0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].channel, Channel::EngineTemp);
        assert_eq!(found[0].min_len, 2);

        let desc = mapping.descriptor(Channel::EngineTemp).unwrap();
        assert_eq!(desc.can_id, 0x1A0);
        assert_eq!(mapping.can_ids(), vec![0x1A0]);
    }

    #[test]
    fn test_shared_id_sorted_by_offset() {
        let mapping = IdentifierMapping::from_descriptors([
            ChannelDescriptor::new(Channel::MotorTemp, 0xA2, 4, 2, ValueType::Signed, 10.0),
            ChannelDescriptor::new(Channel::MotorCoolantTemp, 0xA2, 0, 2, ValueType::Signed, 10.0),
        ])
        .unwrap();

        let found = mapping.get(0xA2).unwrap();
        assert_eq!(found[0].channel, Channel::MotorCoolantTemp);
        assert_eq!(found[1].channel, Channel::MotorTemp);
        assert_eq!(mapping.stats(), MappingStats { num_ids: 1, num_channels: 2 });
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let mut mapping = IdentifierMapping::new();
        mapping.add_descriptor(engine_temp()).unwrap();

        let moved = ChannelDescriptor { can_id: 0x1A1, ..engine_temp() };
        assert!(matches!(
            mapping.add_descriptor(moved),
            Err(DecoderError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let desc = ChannelDescriptor { scale: 0.0, ..engine_temp() };
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_bad_width_rejected() {
        let desc = ChannelDescriptor::new(Channel::Timer, 0xAC, 2, 3, ValueType::Unsigned, 1.0);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_value_outside_min_len_rejected() {
        let desc = engine_temp().with_min_len(1);
        assert!(desc.validate().is_err());

        let too_long = ChannelDescriptor::new(Channel::DcCurrent, 0xA6, 6, 4, ValueType::Signed, 10.0);
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_identifier_above_29_bits_rejected() {
        let flagged = ChannelDescriptor { can_id: 0x8000_01A0, ..engine_temp() };
        assert!(matches!(flagged.validate(), Err(DecoderError::InvalidDescriptor(_))));

        let widest = ChannelDescriptor { can_id: 0x1FFF_FFFF, ..engine_temp() };
        assert!(widest.validate().is_ok());
    }

    #[test]
    fn test_mask_validation() {
        let direction = ChannelDescriptor::new(Channel::Direction, 0xAA, 7, 1, ValueType::Unsigned, 1.0);
        assert!(direction.with_mask(0x01).validate().is_ok());
        assert!(direction.with_mask(0xFF).validate().is_ok());
        assert!(direction.with_mask(0).validate().is_err());
        assert!(direction.with_mask(0x100).validate().is_err());
        assert!(engine_temp().with_mask(0x01).validate().is_err());
    }
}
