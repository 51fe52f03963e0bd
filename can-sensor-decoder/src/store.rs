//! Sensor value store
//!
//! Latest-value cache keyed by [`Channel`]. One slot per channel holds the
//! bit pattern of the last written `f64`, so each write is a single atomic
//! store and readers never observe a torn value. Channels are independent;
//! there is no cross-channel transaction.
//!
//! The store is shared by handle (`Arc<SensorStore>`) between the bus-read
//! loop, the recorder and any display.

use crate::channel::Channel;
use crate::types::Reading;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel stored for a channel that has never been written
pub const NO_VALUE: f64 = f64::NAN;

/// Latest decoded value per channel
pub struct SensorStore {
    slots: [AtomicU64; Channel::COUNT],
}

impl SensorStore {
    /// Create a store with every channel at the sentinel
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| AtomicU64::new(NO_VALUE.to_bits())),
        }
    }

    /// Overwrite the stored value of a channel
    pub fn set(&self, channel: Channel, value: f64) {
        self.slots[channel.index()].store(value.to_bits(), Ordering::Relaxed);
    }

    /// Last value written for a channel, or the NaN sentinel
    pub fn get(&self, channel: Channel) -> f64 {
        f64::from_bits(self.slots[channel.index()].load(Ordering::Relaxed))
    }

    /// Last value written for a channel, `None` for the sentinel
    pub fn latest(&self, channel: Channel) -> Option<f64> {
        let value = self.get(channel);
        (!value.is_nan()).then_some(value)
    }

    /// Write a batch of decoded readings
    pub fn apply(&self, readings: &[Reading]) {
        for reading in readings {
            self.set(reading.channel, reading.value);
        }
    }

    /// Copy every channel's current value
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            values: std::array::from_fn(|i| f64::from_bits(self.slots[i].load(Ordering::Relaxed))),
        }
    }
}

impl Default for SensorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SensorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.snapshot().iter().map(|(channel, value)| (channel.key(), value)))
            .finish()
    }
}

/// Point-in-time copy of the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSnapshot {
    values: [f64; Channel::COUNT],
}

impl StoreSnapshot {
    /// Value of a channel at snapshot time (NaN sentinel if unset)
    pub fn get(&self, channel: Channel) -> f64 {
        self.values[channel.index()]
    }

    /// Value of a channel, `None` for the sentinel
    pub fn latest(&self, channel: Channel) -> Option<f64> {
        let value = self.get(channel);
        (!value.is_nan()).then_some(value)
    }

    /// Iterate over all channels and their values
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL.iter().map(move |&channel| (channel, self.get(channel)))
    }
}
