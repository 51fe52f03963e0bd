//! Linux SocketCAN source
//!
//! Reads classic CAN frames from a named interface (`can0`, `vcan0`). Remote
//! and error frames are dropped; a read timeout is reported as idle.

use super::{FrameSource, ReadOutcome};
use crate::types::{CanFrame, DecoderError, Result};
use ::socketcan::{CanFrame as BusFrame, CanSocket, EmbeddedFrame, Id, Socket};
use std::io;
use std::time::Duration;

/// Frame source bound to a SocketCAN interface
pub struct SocketCanSource {
    socket: CanSocket,
    interface: String,
}

impl SocketCanSource {
    /// Open and bind a raw CAN socket
    pub fn open(interface: &str, read_timeout: Duration) -> Result<Self> {
        log::info!("Opening SocketCAN interface {}", interface);

        let socket = CanSocket::open(interface).map_err(|e| {
            DecoderError::BusError(format!(
                "failed to open {} (is the interface up? `ip link set up {}`): {}",
                interface, interface, e
            ))
        })?;

        socket.set_read_timeout(read_timeout).map_err(|e| {
            DecoderError::BusError(format!("failed to set read timeout on {}: {}", interface, e))
        })?;

        Ok(Self {
            socket,
            interface: interface.to_string(),
        })
    }
}

impl FrameSource for SocketCanSource {
    fn describe(&self) -> String {
        format!("SocketCAN {}", self.interface)
    }

    fn read_frame(&mut self) -> Result<ReadOutcome> {
        match self.socket.read_frame() {
            Ok(BusFrame::Data(frame)) => {
                let (can_id, is_extended) = match frame.id() {
                    Id::Standard(id) => (u32::from(id.as_raw()), false),
                    Id::Extended(id) => (id.as_raw(), true),
                };
                Ok(ReadOutcome::Frame(CanFrame {
                    can_id,
                    data: frame.data().to_vec(),
                    is_extended,
                }))
            }
            Ok(_) => {
                log::trace!("Skipping remote/error frame on {}", self.interface);
                Ok(ReadOutcome::Idle)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(ReadOutcome::Idle)
            }
            Err(e) => Err(DecoderError::BusError(format!(
                "read from {} failed: {}",
                self.interface, e
            ))),
        }
    }
}
