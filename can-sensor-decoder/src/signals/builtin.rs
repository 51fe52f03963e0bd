//! Built-in channel table
//!
//! Engine temperature frame from the dashboard ECU plus the motor controller
//! broadcast frames (0xA1-0xAC). All values are little-endian; motor
//! controller frames are always sent with a full 8-byte payload.

use super::database::{ChannelDescriptor, IdentifierMapping, ValueType};
use crate::channel::Channel;
use crate::types::Result;

/// Engine temperature: int16 LE tenths of a degree
pub const ENGINE_TEMP_ID: u32 = 0x1A0;
pub const MC_TEMP_2_ID: u32 = 0xA1;
pub const MC_TEMP_3_ID: u32 = 0xA2;
pub const MC_MOTOR_POSITION_ID: u32 = 0xA5;
pub const MC_CURRENT_ID: u32 = 0xA6;
pub const MC_VOLTAGE_ID: u32 = 0xA7;
pub const MC_INTERNAL_STATES_ID: u32 = 0xAA;
pub const MC_TORQUE_TIMER_ID: u32 = 0xAC;

const MC_FRAME_LEN: usize = 8;

fn mc(channel: Channel, can_id: u32, offset: usize, width: usize, value_type: ValueType, scale: f64) -> ChannelDescriptor {
    ChannelDescriptor::new(channel, can_id, offset, width, value_type, scale).with_min_len(MC_FRAME_LEN)
}

/// Descriptors for every channel
pub fn descriptors() -> Vec<ChannelDescriptor> {
    use ValueType::{Signed, Unsigned};

    vec![
        ChannelDescriptor::new(Channel::EngineTemp, ENGINE_TEMP_ID, 0, 2, Signed, 10.0),
        mc(Channel::MotorControlBoardTemp, MC_TEMP_2_ID, 0, 2, Signed, 10.0),
        mc(Channel::MotorCoolantTemp, MC_TEMP_3_ID, 0, 2, Signed, 10.0),
        mc(Channel::MotorHeatsinkTemp, MC_TEMP_3_ID, 2, 2, Signed, 10.0),
        mc(Channel::MotorTemp, MC_TEMP_3_ID, 4, 2, Signed, 10.0),
        mc(Channel::MotorAngle, MC_MOTOR_POSITION_ID, 0, 2, Unsigned, 10.0),
        mc(Channel::MotorSpeed, MC_MOTOR_POSITION_ID, 2, 2, Signed, 1.0),
        mc(Channel::DcCurrent, MC_CURRENT_ID, 6, 2, Signed, 10.0),
        mc(Channel::DcVoltage, MC_VOLTAGE_ID, 0, 2, Signed, 10.0),
        mc(Channel::VsmState, MC_INTERNAL_STATES_ID, 0, 1, Unsigned, 1.0),
        mc(Channel::InverterState, MC_INTERNAL_STATES_ID, 2, 1, Unsigned, 1.0),
        // Bit 0 only; the rest of byte 7 carries other status flags
        mc(Channel::Direction, MC_INTERNAL_STATES_ID, 7, 1, Unsigned, 1.0).with_mask(0x01),
        mc(Channel::Torque, MC_TORQUE_TIMER_ID, 0, 2, Signed, 10.0),
        mc(Channel::Timer, MC_TORQUE_TIMER_ID, 2, 2, Unsigned, 1.0),
    ]
}

/// Identifier mapping built from the built-in table
pub fn mapping() -> Result<IdentifierMapping> {
    IdentifierMapping::from_descriptors(descriptors())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_channel_is_mapped() {
        let mapping = mapping().unwrap();
        for channel in Channel::ALL {
            assert!(mapping.descriptor(channel).is_some(), "{} not mapped", channel.key());
        }
        assert_eq!(mapping.stats().num_channels, Channel::COUNT);
        assert_eq!(mapping.stats().num_ids, 8);
    }

    #[test]
    fn test_engine_temp_layout() {
        let mapping = mapping().unwrap();
        let desc = mapping.descriptor(Channel::EngineTemp).unwrap();
        assert_eq!(desc.can_id, 0x1A0);
        assert_eq!(desc.width, 2);
        assert_eq!(desc.min_len, 2);
        assert_eq!(desc.scale, 10.0);
        assert_eq!(desc.value_type, ValueType::Signed);
    }
}
