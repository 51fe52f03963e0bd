//! Frame sources (synthetic generator, candump replay, SocketCAN)
//!
//! Every source hands out one frame at a time through [`FrameSource`]. Which
//! source runs is chosen at startup from [`SourceConfig`].

use crate::types::{CanFrame, DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod replay;
pub mod synthetic;

#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub mod socketcan;

// Re-export source types
pub use replay::ReplaySource;
pub use synthetic::SyntheticSource;

#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub use self::socketcan::SocketCanSource;

/// Result of one read attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A frame was received
    Frame(CanFrame),
    /// Nothing arrived within the read timeout
    Idle,
    /// The source has no more frames
    EndOfStream,
}

/// Common trait for all frame sources
pub trait FrameSource: Send {
    /// Short description for log output
    fn describe(&self) -> String;

    /// Read the next frame
    ///
    /// An `Err` is a bus read failure; the caller decides whether to stop.
    fn read_frame(&mut self) -> Result<ReadOutcome>;
}

/// Which source implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Synthetic,
    Socketcan,
    Replay,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" => Ok(SourceKind::Synthetic),
            "socketcan" => Ok(SourceKind::Socketcan),
            "replay" => Ok(SourceKind::Replay),
            other => Err(format!("unknown frame source '{}'", other)),
        }
    }
}

/// Settings needed to open any frame source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// SocketCAN interface name
    pub interface: String,
    /// candump log to replay
    pub replay_file: Option<PathBuf>,
    /// Blocking read timeout for live buses
    pub read_timeout: Duration,
    /// Synthetic generator cycles per second (0 = unpaced)
    pub rate_hz: u32,
    /// Stop the synthetic generator after this many frames
    pub max_frames: Option<usize>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Synthetic,
            interface: "vcan0".to_string(),
            replay_file: None,
            read_timeout: Duration::from_millis(100),
            rate_hz: 50,
            max_frames: None,
        }
    }
}

/// Open the configured frame source
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    let source: Box<dyn FrameSource> = match config.kind {
        SourceKind::Synthetic => {
            let mut source = SyntheticSource::new(config.rate_hz);
            if let Some(limit) = config.max_frames {
                source = source.with_max_frames(limit);
            }
            Box::new(source)
        }
        SourceKind::Replay => {
            let path = config.replay_file.as_ref().ok_or_else(|| {
                DecoderError::ConfigError("replay source selected but no replay file given".to_string())
            })?;
            Box::new(ReplaySource::open(path)?)
        }
        SourceKind::Socketcan => open_socketcan(config)?,
    };

    log::info!("Frame source: {}", source.describe());
    Ok(source)
}

#[cfg(all(target_os = "linux", feature = "socketcan"))]
fn open_socketcan(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(SocketCanSource::open(&config.interface, config.read_timeout)?))
}

#[cfg(not(all(target_os = "linux", feature = "socketcan")))]
fn open_socketcan(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    Err(DecoderError::ConfigError(format!(
        "cannot open {}: SocketCAN support requires Linux and the `socketcan` feature",
        config.interface
    )))
}
