//! Synthetic frame generator
//!
//! Simulates the car on the bench: a pedal oscillates between 0 and 80 %,
//! motor speed follows it with lag and the temperatures rise with speed.
//! Each cycle emits the engine temperature frame, every motor controller
//! frame and one BMS cell frame that the decoder does not map.
//! Output is deterministic.

use super::{FrameSource, ReadOutcome};
use crate::signals::builtin::{
    ENGINE_TEMP_ID, MC_CURRENT_ID, MC_INTERNAL_STATES_ID, MC_MOTOR_POSITION_ID, MC_TEMP_2_ID,
    MC_TEMP_3_ID, MC_TORQUE_TIMER_ID, MC_VOLTAGE_ID,
};
use crate::types::{CanFrame, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

const AMBIENT_C: f64 = 25.0;
const MAX_SPEED_RPM: f64 = 3000.0;
const BMS_CELLS: u32 = 5;

/// Vehicle simulation emitting bus frames
pub struct SyntheticSource {
    rate_hz: u32,
    max_frames: Option<usize>,
    emitted: usize,
    cycle: u64,
    motor_speed: f64,
    pending: VecDeque<CanFrame>,
    last_cycle: Option<Instant>,
}

impl SyntheticSource {
    /// Create a generator running `rate_hz` cycles per second (0 = as fast as read)
    pub fn new(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            max_frames: None,
            emitted: 0,
            cycle: 0,
            motor_speed: 0.0,
            pending: VecDeque::new(),
            last_cycle: None,
        }
    }

    /// Builder method: end the stream after `limit` frames
    pub fn with_max_frames(mut self, limit: usize) -> Self {
        self.max_frames = Some(limit);
        self
    }

    fn pace(&mut self) {
        if self.rate_hz == 0 {
            return;
        }
        let period = Duration::from_secs_f64(1.0 / self.rate_hz as f64);
        if let Some(last) = self.last_cycle {
            let elapsed = last.elapsed();
            if elapsed < period {
                thread::sleep(period - elapsed);
            }
        }
        self.last_cycle = Some(Instant::now());
    }

    fn generate_cycle(&mut self) {
        let dt = if self.rate_hz == 0 { 0.02 } else { 1.0 / self.rate_hz as f64 };
        let t = self.cycle as f64 * dt;

        // Engine temperature drifts around 85 °C
        let engine_temp = 85.0 + 0.5 * (self.cycle as f64 / 10.0).sin();
        self.push(ENGINE_TEMP_ID, &i16_le(engine_temp * 10.0));

        let pedal = (t * 0.5).sin().abs() * 0.8;
        self.motor_speed += (pedal * MAX_SPEED_RPM - self.motor_speed) * 0.1;
        let load = self.motor_speed / MAX_SPEED_RPM;

        let cb_temp = AMBIENT_C + load * 30.0;
        let coolant_temp = AMBIENT_C + load * 40.0;
        let heatsink_temp = AMBIENT_C + load * 50.0;
        let motor_temp = AMBIENT_C + load * 60.0;
        let voltage = 96.0 + 2.0 * (t * 0.7).sin();
        let current = load * 150.0;
        let torque = current * 0.5;
        let angle = (t * self.motor_speed / 60.0 * 360.0) % 360.0;
        let timer_ms = ((t * 1000.0) as u64 % 65_536) as f64;

        self.push(MC_TEMP_2_ID, &frame8(&[(0, i16_le(cb_temp * 10.0))]));
        self.push(
            MC_TEMP_3_ID,
            &frame8(&[
                (0, i16_le(coolant_temp * 10.0)),
                (2, i16_le(heatsink_temp * 10.0)),
                (4, i16_le(motor_temp * 10.0)),
            ]),
        );
        self.push(
            MC_MOTOR_POSITION_ID,
            &frame8(&[(0, u16_le(angle * 10.0)), (2, i16_le(self.motor_speed))]),
        );
        self.push(MC_CURRENT_ID, &frame8(&[(6, i16_le(current * 10.0))]));
        self.push(MC_VOLTAGE_ID, &frame8(&[(0, i16_le(voltage * 10.0))]));
        // VSM running, inverter active, forward
        self.push(MC_INTERNAL_STATES_ID, &[5, 0, 3, 0, 0, 0, 0, 1]);
        self.push(
            MC_TORQUE_TIMER_ID,
            &frame8(&[(0, i16_le(torque * 10.0)), (2, u16_le(timer_ms))]),
        );

        // BMS cell frame, not decoded
        let cell = (self.cycle % BMS_CELLS as u64) as u32;
        let cell_mv = 3700.0 + 50.0 * (t + cell as f64).sin();
        self.push(cell, &frame8(&[(2, u16_le(100.0)), (4, u16_le(cell_mv))]));

        self.cycle += 1;
    }

    fn push(&mut self, can_id: u32, data: &[u8]) {
        self.pending.push_back(CanFrame::new(can_id, data));
    }
}

impl FrameSource for SyntheticSource {
    fn describe(&self) -> String {
        match self.max_frames {
            Some(limit) => format!("synthetic generator ({} Hz, {} frames)", self.rate_hz, limit),
            None => format!("synthetic generator ({} Hz)", self.rate_hz),
        }
    }

    fn read_frame(&mut self) -> Result<ReadOutcome> {
        if self.max_frames.is_some_and(|limit| self.emitted >= limit) {
            return Ok(ReadOutcome::EndOfStream);
        }

        if self.pending.is_empty() {
            self.pace();
            self.generate_cycle();
        }

        match self.pending.pop_front() {
            Some(frame) => {
                self.emitted += 1;
                Ok(ReadOutcome::Frame(frame))
            }
            None => Ok(ReadOutcome::Idle),
        }
    }
}

fn i16_le(value: f64) -> [u8; 2] {
    let mut buf = [0u8; 2];
    LittleEndian::write_i16(&mut buf, value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16);
    buf
}

fn u16_le(value: f64) -> [u8; 2] {
    let mut buf = [0u8; 2];
    LittleEndian::write_u16(&mut buf, value.round().clamp(0.0, u16::MAX as f64) as u16);
    buf
}

/// 8-byte payload with 16-bit fields placed at the given offsets
fn frame8(fields: &[(usize, [u8; 2])]) -> [u8; 8] {
    let mut data = [0u8; 8];
    for (offset, bytes) in fields {
        data[*offset..*offset + 2].copy_from_slice(bytes);
    }
    data
}
