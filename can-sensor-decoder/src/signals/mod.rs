//! Channel descriptors and the identifier mapping
//!
//! This module contains the per-channel layout table and the lookup from
//! wire identifier to descriptors.

pub mod builtin;
pub mod database;

// Re-export key types for convenience
pub use database::{
    ByteOrder, ChannelDescriptor, IdentifierMapping, MappingStats, ValueType,
};
