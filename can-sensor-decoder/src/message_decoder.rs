//! Value extraction engine
//!
//! Extracts the raw integer for one channel descriptor from a frame payload
//! and converts it to a physical value.

use crate::signals::database::{ByteOrder, ChannelDescriptor, ValueType};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// Message decoder - extracts channel values from payload bytes
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode one channel from payload bytes
    ///
    /// Returns `None` if the payload is shorter than the descriptor's minimum
    /// length. A payload exactly at the minimum length decodes.
    pub fn decode_value(data: &[u8], descriptor: &ChannelDescriptor) -> Option<f64> {
        if data.len() < descriptor.min_len {
            log::trace!(
                "{} requires {} bytes but frame only has {} bytes",
                descriptor.channel.key(),
                descriptor.min_len,
                data.len()
            );
            return None;
        }

        let raw = Self::extract_raw(data, descriptor)?;
        Some(raw / descriptor.scale + descriptor.bias)
    }

    /// Extract the raw integer for a descriptor, widened to f64
    ///
    /// Sign extension follows the descriptor's value type. The bit mask, if
    /// any, applies to unsigned values only.
    fn extract_raw(data: &[u8], descriptor: &ChannelDescriptor) -> Option<f64> {
        let bytes = data.get(descriptor.offset..descriptor.offset + descriptor.width)?;
        let width = descriptor.width;

        let raw = match descriptor.value_type {
            ValueType::Unsigned => {
                let bits = match descriptor.byte_order {
                    ByteOrder::LittleEndian => LittleEndian::read_uint(bytes, width),
                    ByteOrder::BigEndian => BigEndian::read_uint(bytes, width),
                };
                (bits & descriptor.mask.unwrap_or(u64::MAX)) as f64
            }
            ValueType::Signed => match descriptor.byte_order {
                ByteOrder::LittleEndian => LittleEndian::read_int(bytes, width) as f64,
                ByteOrder::BigEndian => BigEndian::read_int(bytes, width) as f64,
            },
        };

        Some(raw)
    }
}
