//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use can_sensor_decoder::{Channel, DecoderConfig, IdWidth, SourceConfig, SourceKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub synthetic: SyntheticConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusConfig {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_interface")]
    pub interface: String,
    pub replay_file: Option<PathBuf>,
    #[serde(default)]
    pub id_width: IdWidth,
    /// Only decode these identifiers (empty = all)
    #[serde(default)]
    pub message_filter: Vec<u32>,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            interface: default_interface(),
            replay_file: None,
            id_width: IdWidth::default(),
            message_filter: Vec::new(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyntheticConfig {
    #[serde(default = "default_rate")]
    pub rate_hz: u32,
    /// 0 = unbounded
    #[serde(default)]
    pub max_frames: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate(),
            max_frames: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_persist_interval")]
    pub interval_ms: u64,
    /// Empty = all channels
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_db_path(),
            interval_ms: default_persist_interval(),
            channels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_display_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_display_channels")]
    pub channels: Vec<Channel>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_display_interval(),
            channels: default_display_channels(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interface() -> String {
    "vcan0".to_string()
}

fn default_read_timeout() -> u64 {
    100
}

fn default_rate() -> u32 {
    50
}

fn default_db_path() -> PathBuf {
    PathBuf::from("can_log.jsonl")
}

fn default_persist_interval() -> u64 {
    500
}

fn default_display_interval() -> u64 {
    200
}

fn default_display_channels() -> Vec<Channel> {
    vec![Channel::EngineTemp]
}

impl AppConfig {
    /// Check values the loops depend on
    pub fn validate(&self) -> Result<()> {
        if self.bus.read_timeout_ms == 0 {
            bail!("bus.read_timeout_ms must be greater than 0");
        }
        if self.persistence.enabled && self.persistence.interval_ms == 0 {
            bail!("persistence.interval_ms must be greater than 0");
        }
        if self.display.enabled && self.display.interval_ms == 0 {
            bail!("display.interval_ms must be greater than 0");
        }
        if self.bus.source == SourceKind::Replay && self.bus.replay_file.is_none() {
            bail!("bus.source = \"replay\" requires bus.replay_file");
        }
        Ok(())
    }

    /// Library decoder settings
    pub fn decoder_config(&self) -> DecoderConfig {
        let config = DecoderConfig::new().with_id_width(self.bus.id_width);
        if self.bus.message_filter.is_empty() {
            config
        } else {
            config.with_message_filter(self.bus.message_filter.clone())
        }
    }

    /// Library frame source settings
    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            kind: self.bus.source,
            interface: self.bus.interface.clone(),
            replay_file: self.bus.replay_file.clone(),
            read_timeout: Duration::from_millis(self.bus.read_timeout_ms),
            rate_hz: self.synthetic.rate_hz,
            max_frames: (self.synthetic.max_frames > 0).then_some(self.synthetic.max_frames),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
