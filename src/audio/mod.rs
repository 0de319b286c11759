//! Audio module - the audio graph and everything under it
//!
//! This module provides:
//! - `AudioSink` trait abstracting the platform audio API
//! - `CpalSink`, the cpal implementation
//! - `AudioGraph`, which owns the context, gain node and sources
//! - Noise burst synthesis

mod engine;
mod graph;
mod noise;
mod sink;

#[cfg(test)]
pub mod fake;

// Re-export public types
pub use engine::CpalSink;
pub use graph::{AudioGraph, GraphConfig};
pub use noise::{BurstShape, BURST_DURATION};
pub use sink::{AudioError, AudioSink, ContextState};
