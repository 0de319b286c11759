//! AudioSink trait - the boundary between the sound toy and the platform
//!
//! The graph manager never touches an audio API directly. Everything it
//! needs (a context, a gain node, oscillators and one-shot buffers) goes
//! through this trait, so the real cpal backend can be swapped for a fake
//! in tests.

use thiserror::Error;

/// Handle to a node living inside an [`AudioSink`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Lifecycle of the output context
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// No context exists (never opened, or closed)
    Closed,
    /// Context exists but is not producing audio
    Suspended,
    /// Context is rendering to the output device
    Running,
}

/// Errors reported by an audio sink
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no output device found")]
    NoOutputDevice,

    #[error("failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to pause output stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[error("audio context is closed")]
    Closed,

    #[error("audio graph is not initialized")]
    NotInitialized,

    #[error("node {0:?} was already stopped")]
    AlreadyStopped(NodeId),

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
}

/// A minimal audio graph backend
///
/// Sources (oscillators and buffers) are connected to a gain node when they
/// are created, and gain nodes are connected to the output destination.
pub trait AudioSink {
    /// Create the output context. Calling it on an open context is a no-op.
    fn open(&mut self) -> Result<(), AudioError>;

    /// Start (or restart) rendering
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Stop rendering without discarding the context
    fn suspend(&mut self) -> Result<(), AudioError>;

    /// Release the context and every node in it
    fn close(&mut self) -> Result<(), AudioError>;

    fn state(&self) -> ContextState;

    /// Sample rate of the context in Hz
    fn sample_rate(&self) -> f32;

    /// Context time in seconds
    fn current_time(&self) -> f64;

    /// Create a gain node connected to the output destination
    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError>;

    /// Create and start a sine oscillator feeding `destination`
    fn start_oscillator(
        &mut self,
        frequency: f32,
        destination: NodeId,
    ) -> Result<NodeId, AudioError>;

    /// Schedule a frequency change on a live oscillator at context time `when`
    fn set_frequency_at(
        &mut self,
        node: NodeId,
        frequency: f32,
        when: f64,
    ) -> Result<(), AudioError>;

    /// Create and start a one-shot buffer source feeding `destination`
    ///
    /// The source stops by itself once the buffer has been played.
    fn start_buffer(
        &mut self,
        samples: Vec<f32>,
        destination: NodeId,
    ) -> Result<NodeId, AudioError>;

    /// Stop and disconnect a source
    ///
    /// Returns [`AudioError::AlreadyStopped`] if the source is no longer live.
    fn stop(&mut self, node: NodeId) -> Result<(), AudioError>;

    /// Disconnect a gain node from the destination
    fn disconnect(&mut self, node: NodeId) -> Result<(), AudioError>;
}
