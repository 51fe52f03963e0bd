//! Bus-read loop
//!
//! Pulls frames from a [`FrameSource`], decodes them and writes the readings
//! into the [`SensorStore`]. Consumers poll the store on their own schedule;
//! nothing here waits for them.

use crate::decoder::FrameDecoder;
use crate::sources::{FrameSource, ReadOutcome};
use crate::store::SensorStore;
use crate::types::{CanFrame, Decoded, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Counters collected by [`run_feed`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Frames received from the source
    pub frames_read: u64,
    /// Frames that produced at least one reading
    pub frames_decoded: u64,
    /// Frames ignored (unmapped identifier or short payload)
    pub frames_ignored: u64,
    /// Channel values written to the store
    pub readings_written: u64,
    /// Read attempts that timed out without a frame
    pub idle_polls: u64,
}

/// Why the feed loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedExit {
    /// The stop flag was raised
    Stopped,
    /// The source ran out of frames
    EndOfStream,
    /// The frame limit was reached
    FrameLimit,
}

/// Decode one frame and write its readings into the store
///
/// Returns the decode outcome so callers can count or display it.
pub fn ingest(decoder: &FrameDecoder, store: &SensorStore, frame: &CanFrame) -> Decoded {
    let decoded = decoder.decode(frame);
    store.apply(decoded.readings());
    decoded
}

/// Run the bus-read loop until stopped, exhausted or the frame limit is hit
///
/// A bus read failure ends the loop and is returned to the caller. Readings
/// already written stay in the store.
pub fn run_feed(
    source: &mut dyn FrameSource,
    decoder: &FrameDecoder,
    store: &SensorStore,
    stop: &AtomicBool,
    max_frames: Option<u64>,
) -> Result<(FeedExit, FeedStats)> {
    log::info!("Feed loop started on {}", source.describe());
    let mut stats = FeedStats::default();

    let exit = loop {
        if stop.load(Ordering::Relaxed) {
            break FeedExit::Stopped;
        }
        if max_frames.is_some_and(|limit| stats.frames_read >= limit) {
            break FeedExit::FrameLimit;
        }

        let frame = match source.read_frame() {
            Ok(ReadOutcome::Frame(frame)) => frame,
            Ok(ReadOutcome::Idle) => {
                stats.idle_polls += 1;
                continue;
            }
            Ok(ReadOutcome::EndOfStream) => break FeedExit::EndOfStream,
            Err(e) => {
                log::error!("Feed loop aborted after {} frames: {}", stats.frames_read, e);
                return Err(e);
            }
        };

        stats.frames_read += 1;
        match ingest(decoder, store, &frame) {
            Decoded::Ignored => stats.frames_ignored += 1,
            Decoded::Readings(readings) => {
                stats.frames_decoded += 1;
                stats.readings_written += readings.len() as u64;
            }
        }
    };

    log::info!(
        "Feed loop finished ({:?}): {} frames read, {} decoded, {} ignored",
        exit,
        stats.frames_read,
        stats.frames_decoded,
        stats.frames_ignored
    );
    Ok((exit, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::config::DecoderConfig;
    use crate::types::DecoderError;
    use std::collections::VecDeque;

    /// Scripted source for loop tests
    struct ScriptedSource {
        script: VecDeque<Result<ReadOutcome>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<ReadOutcome>>) -> Self {
            Self { script: script.into() }
        }
    }

    impl FrameSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        fn read_frame(&mut self) -> Result<ReadOutcome> {
            self.script.pop_front().unwrap_or(Ok(ReadOutcome::EndOfStream))
        }
    }

    fn frame(can_id: u32, data: &[u8]) -> Result<ReadOutcome> {
        Ok(ReadOutcome::Frame(CanFrame::new(can_id, data)))
    }

    fn decoder() -> FrameDecoder {
        FrameDecoder::new(DecoderConfig::new()).unwrap()
    }

    #[test]
    fn test_feed_writes_store() {
        let mut source = ScriptedSource::new(vec![
            frame(0x123, &[1, 2, 3]),
            Ok(ReadOutcome::Idle),
            frame(0x1A0, &[0x57, 0x03]),
            frame(0x1A0, &[0x57]),
        ]);
        let store = SensorStore::new();
        let stop = AtomicBool::new(false);

        let (exit, stats) = run_feed(&mut source, &decoder(), &store, &stop, None).unwrap();

        assert_eq!(exit, FeedExit::EndOfStream);
        assert_eq!(stats.frames_read, 3);
        assert_eq!(stats.frames_decoded, 1);
        assert_eq!(stats.frames_ignored, 2);
        assert_eq!(stats.readings_written, 1);
        assert_eq!(stats.idle_polls, 1);
        assert_eq!(store.get(Channel::EngineTemp), 85.5);
    }

    #[test]
    fn test_ignored_frames_leave_store_unchanged() {
        let mut source = ScriptedSource::new(vec![frame(0x1A0, &[0x57, 0x03]), frame(0x7FF, &[0x00, 0xFF])]);
        let store = SensorStore::new();

        run_feed(&mut source, &decoder(), &store, &AtomicBool::new(false), None).unwrap();

        assert_eq!(store.get(Channel::EngineTemp), 85.5);
        for channel in Channel::ALL.iter().skip(1) {
            assert!(store.get(*channel).is_nan());
        }
    }

    #[test]
    fn test_bus_error_is_returned() {
        let mut source = ScriptedSource::new(vec![
            frame(0x1A0, &[0x57, 0x03]),
            Err(DecoderError::BusError("interface went down".to_string())),
            frame(0x1A0, &[0x00, 0xFF]),
        ]);
        let store = SensorStore::new();

        let result = run_feed(&mut source, &decoder(), &store, &AtomicBool::new(false), None);

        assert!(matches!(result, Err(DecoderError::BusError(_))));
        assert_eq!(store.get(Channel::EngineTemp), 85.5);
    }

    #[test]
    fn test_frame_limit() {
        let mut source = ScriptedSource::new(vec![
            frame(0x1A0, &[0x57, 0x03]),
            frame(0x1A0, &[0x00, 0xFF]),
        ]);
        let store = SensorStore::new();

        let (exit, stats) = run_feed(&mut source, &decoder(), &store, &AtomicBool::new(false), Some(1)).unwrap();

        assert_eq!(exit, FeedExit::FrameLimit);
        assert_eq!(stats.frames_read, 1);
        assert_eq!(store.get(Channel::EngineTemp), 85.5);
    }

    #[test]
    fn test_stop_flag() {
        let mut source = ScriptedSource::new(vec![frame(0x1A0, &[0x57, 0x03])]);
        let store = SensorStore::new();

        let (exit, stats) = run_feed(&mut source, &decoder(), &store, &AtomicBool::new(true), None).unwrap();

        assert_eq!(exit, FeedExit::Stopped);
        assert_eq!(stats.frames_read, 0);
        assert!(store.get(Channel::EngineTemp).is_nan());
    }
}
