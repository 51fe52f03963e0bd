//! Logical sensor channels
//!
//! The channel set is closed and fixed at build time. Each channel owns one
//! slot in the [`SensorStore`](crate::SensorStore) and one column in
//! persisted records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical sensor reading carried on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    EngineTemp,
    MotorControlBoardTemp,
    MotorCoolantTemp,
    MotorHeatsinkTemp,
    MotorTemp,
    MotorAngle,
    MotorSpeed,
    DcCurrent,
    DcVoltage,
    VsmState,
    InverterState,
    Direction,
    Torque,
    Timer,
}

impl Channel {
    /// Number of channels
    pub const COUNT: usize = 14;

    /// All channels in store order
    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::EngineTemp,
        Channel::MotorControlBoardTemp,
        Channel::MotorCoolantTemp,
        Channel::MotorHeatsinkTemp,
        Channel::MotorTemp,
        Channel::MotorAngle,
        Channel::MotorSpeed,
        Channel::DcCurrent,
        Channel::DcVoltage,
        Channel::VsmState,
        Channel::InverterState,
        Channel::Direction,
        Channel::Torque,
        Channel::Timer,
    ];

    /// Slot index of this channel in the store
    pub fn index(self) -> usize {
        self as usize
    }

    /// Configuration key (matches the serde representation)
    pub fn key(self) -> &'static str {
        match self {
            Channel::EngineTemp => "engine_temp",
            Channel::MotorControlBoardTemp => "motor_control_board_temp",
            Channel::MotorCoolantTemp => "motor_coolant_temp",
            Channel::MotorHeatsinkTemp => "motor_heatsink_temp",
            Channel::MotorTemp => "motor_temp",
            Channel::MotorAngle => "motor_angle",
            Channel::MotorSpeed => "motor_speed",
            Channel::DcCurrent => "dc_current",
            Channel::DcVoltage => "dc_voltage",
            Channel::VsmState => "vsm_state",
            Channel::InverterState => "inverter_state",
            Channel::Direction => "direction",
            Channel::Torque => "torque",
            Channel::Timer => "timer",
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Channel::EngineTemp => "Engine Temp",
            Channel::MotorControlBoardTemp => "Control Board Temp",
            Channel::MotorCoolantTemp => "Coolant Temp",
            Channel::MotorHeatsinkTemp => "Heatsink Temp",
            Channel::MotorTemp => "Motor Temp",
            Channel::MotorAngle => "Motor Angle",
            Channel::MotorSpeed => "Motor Speed",
            Channel::DcCurrent => "DC Current",
            Channel::DcVoltage => "DC Voltage",
            Channel::VsmState => "VSM State",
            Channel::InverterState => "Inverter State",
            Channel::Direction => "Direction",
            Channel::Torque => "Torque",
            Channel::Timer => "Timer",
        }
    }

    /// Column name used in persisted records (e.g. "EngineTemp_C")
    pub fn column(self) -> &'static str {
        match self {
            Channel::EngineTemp => "EngineTemp_C",
            Channel::MotorControlBoardTemp => "MotorCBTemp_C",
            Channel::MotorCoolantTemp => "MotorCoolantTemp_C",
            Channel::MotorHeatsinkTemp => "MotorHeatsinkTemp_C",
            Channel::MotorTemp => "MotorTemp_C",
            Channel::MotorAngle => "MotorAngle_deg",
            Channel::MotorSpeed => "MotorSpeed_rpm",
            Channel::DcCurrent => "DCCurrent_A",
            Channel::DcVoltage => "DCVoltage_V",
            Channel::VsmState => "VSMState",
            Channel::InverterState => "InverterState",
            Channel::Direction => "Direction",
            Channel::Torque => "Torque_Nm",
            Channel::Timer => "Timer_ms",
        }
    }

    /// Engineering unit (e.g., "°C", "rpm", "V"), if the channel has one
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Channel::EngineTemp
            | Channel::MotorControlBoardTemp
            | Channel::MotorCoolantTemp
            | Channel::MotorHeatsinkTemp
            | Channel::MotorTemp => Some("°C"),
            Channel::MotorAngle => Some("deg"),
            Channel::MotorSpeed => Some("rpm"),
            Channel::DcCurrent => Some("A"),
            Channel::DcVoltage => Some("V"),
            Channel::Torque => Some("Nm"),
            Channel::Timer => Some("ms"),
            Channel::VsmState | Channel::InverterState | Channel::Direction => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| format!("unknown channel '{}'", s))
    }
}
