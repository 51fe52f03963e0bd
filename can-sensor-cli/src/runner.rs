//! Runtime wiring
//!
//! One feed thread decodes frames into the shared store. A recorder thread
//! snapshots the store on its own interval. The calling thread drives the
//! display and the run deadline. All three stop on the same flag.

use crate::config::AppConfig;
use crate::display;
use anyhow::{anyhow, Context, Result};
use can_sensor_decoder::{
    open_source, run_feed, FeedExit, FeedStats, FrameDecoder, JsonLinesSink, Recorder, SensorStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest sleep between stop-flag checks
const POLL_STEP: Duration = Duration::from_millis(50);

/// Limits applied on top of the configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this long
    pub duration: Option<Duration>,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

/// What a finished run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub exit: FeedExit,
    pub stats: FeedStats,
    pub records_written: u64,
    pub record_failures: u64,
}

/// Raises the stop flag when dropped, so an early return never leaves a
/// worker thread running
struct StopGuard(Arc<AtomicBool>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Run feed, recorder and display until the source ends, a limit is hit,
/// the bus fails or `stop` is raised (e.g. from a signal handler)
pub fn run(config: &AppConfig, options: &RunOptions, stop: Arc<AtomicBool>) -> Result<RunSummary> {
    let decoder = FrameDecoder::new(config.decoder_config()).context("Failed to build decoder")?;
    let stats = decoder.mapping_stats();
    log::info!(
        "Decoding {} channels from {} identifiers",
        stats.num_channels,
        stats.num_ids
    );

    let mut source = open_source(&config.source_config()).context("Failed to open frame source")?;

    let store = Arc::new(SensorStore::new());

    let feed = {
        let store = Arc::clone(&store);
        let stop = Arc::clone(&stop);
        let max_frames = options.max_frames;
        thread::Builder::new()
            .name("can-feed".to_string())
            .spawn(move || run_feed(source.as_mut(), &decoder, &store, &stop, max_frames))
            .context("Failed to spawn feed thread")?
    };
    let _stop_guard = StopGuard(Arc::clone(&stop));

    let recorder = if config.persistence.enabled {
        open_recorder(config).map(|recorder| {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            let interval = Duration::from_millis(config.persistence.interval_ms);
            thread::Builder::new()
                .name("can-recorder".to_string())
                .spawn(move || recorder_loop(recorder, &store, &stop, interval))
        })
    } else {
        log::info!("Persistence disabled");
        None
    };
    let recorder = recorder.transpose().context("Failed to spawn recorder thread")?;

    let tick = if config.display.enabled {
        Duration::from_millis(config.display.interval_ms)
    } else {
        POLL_STEP
    };
    let started = Instant::now();

    while !feed.is_finished() {
        if stop.load(Ordering::Relaxed) {
            log::info!("Stop requested");
            break;
        }
        if options.duration.is_some_and(|limit| started.elapsed() >= limit) {
            log::info!("Run duration reached");
            break;
        }
        if wait_or_stop(&stop, tick) {
            continue;
        }
        if config.display.enabled {
            println!("{}", display::render_line(&store.snapshot(), &config.display.channels));
        }
    }

    stop.store(true, Ordering::Relaxed);

    let feed_result = feed.join().map_err(|_| anyhow!("Feed thread panicked"))?;
    let (records_written, record_failures) = match recorder {
        Some(handle) => handle.join().map_err(|_| anyhow!("Recorder thread panicked"))?,
        None => (0, 0),
    };

    let (exit, stats) = feed_result.context("Bus read failed")?;

    Ok(RunSummary {
        exit,
        stats,
        records_written,
        record_failures,
    })
}

/// Open the configured sink; a failure leaves the run without persistence
fn open_recorder(config: &AppConfig) -> Option<Recorder> {
    match JsonLinesSink::open(&config.persistence.path) {
        Ok(sink) => Some(Recorder::with_channels(
            Box::new(sink),
            config.persistence.channels.clone(),
        )),
        Err(e) => {
            log::error!("Continuing without persistence: {}", e);
            None
        }
    }
}

/// Append a record every `interval` and once more on shutdown
fn recorder_loop(
    mut recorder: Recorder,
    store: &SensorStore,
    stop: &AtomicBool,
    interval: Duration,
) -> (u64, u64) {
    let mut written = 0;
    loop {
        let stopping = wait_or_stop(stop, interval);
        match recorder.record(store) {
            Ok(id) => {
                written += 1;
                log::debug!("Stored record {}", id);
            }
            Err(e) => log::warn!("Failed to store record: {}", e),
        }
        if stopping {
            break;
        }
    }
    (written, recorder.failures())
}

/// Sleep for `period` unless the stop flag is raised first
///
/// Returns true if stopped.
fn wait_or_stop(stop: &AtomicBool, period: Duration) -> bool {
    let deadline = Instant::now() + period;
    loop {
        if stop.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep((deadline - now).min(POLL_STEP));
    }
}
