//! CAN Sensor Decoder Library
//!
//! Decodes sensor values from CAN frames and keeps the latest value of every
//! channel for display and logging consumers.
//!
//! # Architecture
//!
//! - A [`FrameSource`] hands out one frame at a time (synthetic generator,
//!   candump replay or a live SocketCAN interface)
//! - The [`FrameDecoder`] maps the frame identifier to channel descriptors and
//!   scales the payload into physical values. Decoding is pure.
//! - The caller writes the readings into the [`SensorStore`], a lock-free
//!   latest-value cache shared by handle
//! - A [`Recorder`] snapshots the store on its own schedule and appends records
//!   to a [`RecordSink`]
//!
//! The library does NOT:
//! - Keep value history
//! - Render anything
//! - Retry bus reads
//!
//! # Example Usage
//!
//! ```
//! use can_sensor_decoder::{CanFrame, Channel, DecoderConfig, FrameDecoder, SensorStore};
//!
//! let decoder = FrameDecoder::new(DecoderConfig::new()).unwrap();
//! let store = SensorStore::new();
//! assert!(store.get(Channel::EngineTemp).is_nan());
//!
//! let decoded = decoder.decode(&CanFrame::new(0x1A0, &[0x57, 0x03]));
//! store.apply(decoded.readings());
//!
//! assert_eq!(store.get(Channel::EngineTemp), 85.5);
//! ```

// Public modules
pub mod channel;
pub mod config;
pub mod decoder;
pub mod feed;
pub mod signals;
pub mod sink;
pub mod sources;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use channel::Channel;
pub use config::{DecoderConfig, IdWidth};
pub use decoder::FrameDecoder;
pub use feed::{ingest, run_feed, FeedExit, FeedStats};
pub use signals::{ByteOrder, ChannelDescriptor, IdentifierMapping, MappingStats, ValueType};
pub use sink::{JsonLinesSink, MemorySink, PersistedRecord, RecordSink, Recorder};
pub use sources::{open_source, FrameSource, ReadOutcome, SourceConfig, SourceKind};
pub use store::{SensorStore, StoreSnapshot, NO_VALUE};
pub use types::{CanFrame, Decoded, DecoderError, Reading, Result, Timestamp};

// Internal modules (not exposed in public API)
mod message_decoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
