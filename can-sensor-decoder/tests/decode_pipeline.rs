// End-to-end checks: source -> decoder -> store -> recorder
use can_sensor_decoder::{
    run_feed, CanFrame, Channel, DecoderConfig, FeedExit, FrameDecoder, FrameSource,
    JsonLinesSink, PersistedRecord, ReadOutcome, Recorder, SensorStore,
};
use can_sensor_decoder::sources::{ReplaySource, SyntheticSource};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::{NamedTempFile, TempDir};

fn decoder() -> FrameDecoder {
    let _ = env_logger::builder().is_test(true).try_init();
    FrameDecoder::new(DecoderConfig::new()).unwrap()
}

#[test]
fn every_unmapped_standard_id_is_ignored() {
    let decoder = decoder();
    let mapped = decoder.mapping().can_ids();
    let store = SensorStore::new();

    for can_id in 0..=0x7FF_u32 {
        if mapped.contains(&can_id) {
            continue;
        }
        let decoded = decoder.decode(&CanFrame::new(can_id, &[0x57, 0x03, 0, 0, 0, 0, 0, 0]));
        assert!(decoded.is_ignored(), "0x{:X} should be ignored", can_id);
        store.apply(decoded.readings());
    }

    for channel in Channel::ALL {
        assert!(store.get(channel).is_nan());
    }
}

#[test]
fn every_short_payload_is_ignored() {
    let decoder = decoder();
    for can_id in decoder.mapping().can_ids() {
        let min_len = decoder
            .mapping()
            .get(can_id)
            .unwrap()
            .iter()
            .map(|d| d.min_len)
            .min()
            .unwrap();
        for len in 0..min_len {
            let data = vec![0x11; len];
            assert!(
                decoder.decode(&CanFrame::new(can_id, &data)).is_ignored(),
                "0x{:X} with {} bytes should be ignored",
                can_id,
                len
            );
        }
    }
}

#[test]
fn replayed_log_updates_store_last_write_wins() {
    let log = "\
(1697040000.000000) vcan0 003#0000640074000000
(1697040000.100000) vcan0 1A0#5703
(1697040000.200000) vcan0 1A0#00
(1697040000.300000) vcan0 1A0#00FF
";
    let mut source = ReplaySource::from_reader(Cursor::new(log), "inline");
    let store = SensorStore::new();
    let stop = AtomicBool::new(false);

    let (exit, stats) = run_feed(&mut source, &decoder(), &store, &stop, None).unwrap();

    assert_eq!(exit, FeedExit::EndOfStream);
    assert_eq!(stats.frames_read, 4);
    assert_eq!(stats.frames_decoded, 2);
    assert_eq!(stats.frames_ignored, 2);
    assert_eq!(store.get(Channel::EngineTemp), -25.6);
}

#[test]
fn synthetic_source_populates_every_channel() {
    let mut source = SyntheticSource::new(0).with_max_frames(9 * 20);
    let store = SensorStore::new();
    let stop = AtomicBool::new(false);

    let (exit, stats) = run_feed(&mut source, &decoder(), &store, &stop, None).unwrap();

    assert_eq!(exit, FeedExit::EndOfStream);
    // One BMS frame per cycle is not mapped
    assert_eq!(stats.frames_ignored, 20);
    for channel in Channel::ALL {
        assert!(store.latest(channel).is_some(), "{} never written", channel.key());
    }
    let engine = store.get(Channel::EngineTemp);
    assert!((84.5..=85.5).contains(&engine));
    assert_eq!(store.get(Channel::VsmState), 5.0);
    assert_eq!(store.get(Channel::Direction), 1.0);
}

#[test]
fn replay_file_to_json_lines() {
    let mut log = NamedTempFile::new().unwrap();
    writeln!(log, "(1697040000.000000) vcan0 1A0#5703").unwrap();
    writeln!(log, "(1697040000.100000) vcan0 0A7#C003000000000000").unwrap();
    log.flush().unwrap();

    let dir = TempDir::new().unwrap();
    let db = dir.path().join("can_log.jsonl");

    let mut source = ReplaySource::open(log.path()).unwrap();
    let store = SensorStore::new();
    run_feed(&mut source, &decoder(), &store, &AtomicBool::new(false), None).unwrap();

    let mut recorder = Recorder::with_channels(
        Box::new(JsonLinesSink::open(&db).unwrap()),
        vec![Channel::EngineTemp, Channel::DcVoltage, Channel::MotorTemp],
    );
    recorder.record(&store).unwrap();

    let content = std::fs::read_to_string(&db).unwrap();
    let record: PersistedRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(record.id, 1);
    assert_eq!(record.timestamp.len(), "YYYY-MM-DD HH:MM:SS".len());
    assert_eq!(record.value(Channel::EngineTemp), Some(85.5));
    assert_eq!(record.value(Channel::DcVoltage), Some(96.0));
    assert_eq!(record.value(Channel::MotorTemp), None);
}

/// Source that never ends until the stop flag is raised elsewhere
struct EndlessEngineTemp;

impl FrameSource for EndlessEngineTemp {
    fn describe(&self) -> String {
        "endless".to_string()
    }

    fn read_frame(&mut self) -> can_sensor_decoder::Result<ReadOutcome> {
        Ok(ReadOutcome::Frame(CanFrame::new(0x1A0, &[0x57, 0x03])))
    }
}

#[test]
fn feed_thread_and_reader_thread_share_store() {
    let store = Arc::new(SensorStore::new());
    let stop = Arc::new(AtomicBool::new(false));

    let feed_store = Arc::clone(&store);
    let feed_stop = Arc::clone(&stop);
    let feed = thread::spawn(move || {
        let mut source = EndlessEngineTemp;
        run_feed(&mut source, &decoder(), &feed_store, &feed_stop, None)
    });

    // Reader polls independently of decode timing
    while store.latest(Channel::EngineTemp).is_none() {
        thread::yield_now();
    }
    assert_eq!(store.get(Channel::EngineTemp), 85.5);
    assert!(store.get(Channel::MotorTemp).is_nan());

    stop.store(true, Ordering::Relaxed);
    let (exit, stats) = feed.join().unwrap().unwrap();
    assert_eq!(exit, FeedExit::Stopped);
    assert!(stats.frames_decoded > 0);
}
