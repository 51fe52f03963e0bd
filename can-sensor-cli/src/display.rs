//! Terminal display
//!
//! Renders selected channels from a store snapshot, one line per poll.
//! Channels without a value yet are shown as `---`.

use can_sensor_decoder::{Channel, StoreSnapshot};

/// Placeholder for a channel with no value yet
pub const NO_VALUE_TEXT: &str = "---";

/// Format one value with one decimal and the channel unit
pub fn format_value(channel: Channel, value: f64) -> String {
    let number = if value.is_nan() {
        NO_VALUE_TEXT.to_string()
    } else {
        format!("{:.1}", value)
    };

    match channel.unit() {
        Some(unit) => format!("{} {}", number, unit),
        None => number,
    }
}

/// Render the selected channels as a single status line
pub fn render_line(snapshot: &StoreSnapshot, channels: &[Channel]) -> String {
    channels
        .iter()
        .map(|&channel| format!("{}: {}", channel.label(), format_value(channel, snapshot.get(channel))))
        .collect::<Vec<_>>()
        .join(" | ")
}
