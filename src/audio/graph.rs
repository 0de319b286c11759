//! Audio graph manager
//!
//! Owns one output context (through an [`AudioSink`]), one gain node and the
//! transient sources hanging off it: at most one oscillator and at most one
//! noise buffer at any time.

use super::noise::{noise_burst, BurstShape};
use super::sink::{AudioError, AudioSink, ContextState, NodeId};

/// Output level of everything the graph plays
pub const DEFAULT_GAIN: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphConfig {
    /// Gain node level (0.0 to 1.0)
    pub gain: f32,
    /// Tone range and length of noise bursts
    pub burst: BurstShape,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            gain: DEFAULT_GAIN,
            burst: BurstShape::default(),
        }
    }
}

/// Stop a source, treating "already stopped" as success
fn stop_source<S: AudioSink>(sink: &mut S, node: NodeId, what: &str) {
    match sink.stop(node) {
        Ok(()) => {}
        Err(AudioError::AlreadyStopped(_)) => log::debug!("{} already stopped", what),
        Err(e) => log::warn!("Failed to stop {}: {}", what, e),
    }
}

pub struct AudioGraph<S: AudioSink> {
    sink: S,
    pub config: GraphConfig,
    /// Gain node connected to the destination; `Some` once initialized
    gain: Option<NodeId>,
    oscillator: Option<NodeId>,
    noise: Option<NodeId>,
}

impl<S: AudioSink> AudioGraph<S> {
    pub fn new(sink: S, config: GraphConfig) -> Self {
        Self {
            sink,
            config,
            gain: None,
            oscillator: None,
            noise: None,
        }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_initialized(&self) -> bool {
        self.gain.is_some()
    }

    /// Whether a tone oscillator is live
    pub fn has_tone(&self) -> bool {
        self.oscillator.is_some()
    }

    #[cfg(test)]
    pub fn has_noise(&self) -> bool {
        self.noise.is_some()
    }

    pub fn context_state(&self) -> ContextState {
        self.sink.state()
    }

    /// Open and resume the context and create the gain node
    ///
    /// Does nothing if already initialized. Must be triggered by a user
    /// gesture.
    pub fn initialize(&mut self) -> Result<(), AudioError> {
        if self.is_initialized() {
            return Ok(());
        }

        let result = self
            .sink
            .open()
            .and_then(|_| self.sink.resume())
            .and_then(|_| self.sink.create_gain(self.config.gain));

        match result {
            Ok(gain) => {
                self.gain = Some(gain);
                log::info!("Audio graph initialized (gain {})", self.config.gain);
                Ok(())
            }
            Err(e) => {
                log::error!("Audio initialization failed: {}", e);
                if let Err(close_err) = self.sink.close() {
                    log::debug!("Close after failed init: {}", close_err);
                }
                Err(e)
            }
        }
    }

    /// Resume the context if it is not running
    pub fn resume(&mut self) -> Result<(), AudioError> {
        if !self.is_initialized() {
            return Err(AudioError::NotInitialized);
        }
        if self.sink.state() != ContextState::Running {
            self.sink.resume()?;
        }
        Ok(())
    }

    /// Pause the context, keeping the graph
    pub fn suspend(&mut self) -> Result<(), AudioError> {
        if !self.is_initialized() {
            return Ok(());
        }
        self.sink.suspend()
    }

    /// Replace any live oscillator with a new sine at `frequency`
    pub fn start_tone(&mut self, frequency: f32) -> Result<(), AudioError> {
        let gain = self.gain.ok_or(AudioError::NotInitialized)?;

        if let Some(old) = self.oscillator.take() {
            stop_source(&mut self.sink, old, "oscillator");
        }

        self.resume()?;
        let node = self.sink.start_oscillator(frequency, gain)?;
        self.oscillator = Some(node);
        log::debug!("Tone started at {:.1} Hz", frequency);
        Ok(())
    }

    /// Change the live oscillator's frequency right now
    pub fn set_frequency(&mut self, frequency: f32) -> Result<(), AudioError> {
        let node = self.oscillator.ok_or(AudioError::NotInitialized)?;
        let now = self.sink.current_time();
        self.sink.set_frequency_at(node, frequency, now)
    }

    /// Replace any live noise source with a fresh burst shaped by `frequency`
    pub fn play_noise_burst(&mut self, frequency: f32) -> Result<(), AudioError> {
        let gain = self.gain.ok_or(AudioError::NotInitialized)?;

        if let Some(old) = self.noise.take() {
            stop_source(&mut self.sink, old, "noise");
        }

        let samples = noise_burst(
            frequency,
            &self.config.burst,
            self.sink.sample_rate(),
            &mut rand::rng(),
        );
        self.resume()?;
        let node = self.sink.start_buffer(samples, gain)?;
        self.noise = Some(node);
        log::debug!("Noise burst at {:.1} Hz", frequency);
        Ok(())
    }

    /// Stop and disconnect every source. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let Some(node) = self.oscillator.take() {
            stop_source(&mut self.sink, node, "oscillator");
        }
        if let Some(node) = self.noise.take() {
            stop_source(&mut self.sink, node, "noise");
        }
    }

    /// Tear everything down and close the context
    pub fn close(&mut self) {
        self.teardown();
        if let Some(gain) = self.gain.take() {
            if let Err(e) = self.sink.disconnect(gain) {
                log::debug!("Gain disconnect: {}", e);
            }
        }
        if self.sink.state() != ContextState::Closed {
            if let Err(e) = self.sink.close() {
                log::warn!("Failed to close audio context: {}", e);
            }
        }
    }
}

impl<S: AudioSink> Drop for AudioGraph<S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fake::{FakeNode, FakeSink};

    fn ready_graph() -> AudioGraph<FakeSink> {
        let mut graph = AudioGraph::new(FakeSink::default(), GraphConfig::default());
        graph.initialize().unwrap();
        graph
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut graph = ready_graph();
        graph.initialize().unwrap();

        assert_eq!(graph.sink().open_calls, 1);
        assert_eq!(graph.sink().gains(), vec![0.1]);
        assert_eq!(graph.context_state(), ContextState::Running);
    }

    #[test]
    fn test_initialize_without_audio() {
        let mut graph = AudioGraph::new(FakeSink::unavailable(), GraphConfig::default());
        assert!(matches!(graph.initialize(), Err(AudioError::NoOutputDevice)));
        assert!(!graph.is_initialized());
        assert!(matches!(graph.start_tone(440.0), Err(AudioError::NotInitialized)));
    }

    #[test]
    fn test_single_oscillator() {
        let mut graph = ready_graph();
        graph.start_tone(440.0).unwrap();
        graph.start_tone(550.0).unwrap();

        assert_eq!(graph.sink().oscillators(), vec![550.0]);
    }

    #[test]
    fn test_set_frequency_at_current_time() {
        let mut graph = ready_graph();
        graph.start_tone(440.0).unwrap();
        graph.sink.time = 1.25;
        graph.set_frequency(600.0).unwrap();

        assert_eq!(graph.sink().oscillators(), vec![600.0]);
        let (_, freq, when) = graph.sink().frequency_updates[0];
        assert_eq!(freq, 600.0);
        assert_eq!(when, 1.25);
    }

    #[test]
    fn test_single_noise_source() {
        let mut graph = ready_graph();
        graph.play_noise_burst(440.0).unwrap();
        graph.play_noise_burst(880.0).unwrap();

        assert_eq!(graph.sink().buffers(), 1);
        assert!(graph.has_noise());
    }

    #[test]
    fn test_noise_buffer_length() {
        let mut graph = ready_graph();
        graph.play_noise_burst(440.0).unwrap();

        let lens: Vec<_> = graph
            .sink()
            .nodes
            .values()
            .filter_map(|n| match n {
                FakeNode::Buffer { len, .. } => Some(*len),
                _ => None,
            })
            .collect();
        assert_eq!(lens, vec![9600]);
    }

    #[test]
    fn test_noise_burst_uses_configured_range() {
        let config = GraphConfig {
            burst: BurstShape {
                min_frequency: 100.0,
                max_frequency: 300.0,
                ..BurstShape::default()
            },
            ..GraphConfig::default()
        };
        let mut graph = AudioGraph::new(FakeSink::default(), config);
        graph.initialize().unwrap();
        graph.play_noise_burst(300.0).unwrap();

        let peak = graph
            .sink()
            .nodes
            .values()
            .find_map(|n| match n {
                FakeNode::Buffer { peak, .. } => Some(*peak),
                _ => None,
            })
            .unwrap();
        // 300 Hz is the top of this range, so the burst is at full level.
        // Over the default 220..880 range it could never exceed 0.72.
        assert!(peak > 0.72, "peak {}", peak);
    }

    #[test]
    fn test_teardown_twice() {
        let mut graph = ready_graph();
        graph.start_tone(440.0).unwrap();
        graph.play_noise_burst(440.0).unwrap();

        graph.teardown();
        graph.teardown();

        assert!(graph.sink().oscillators().is_empty());
        assert_eq!(graph.sink().buffers(), 0);
        assert!(graph.is_initialized());
    }

    #[test]
    fn test_teardown_after_burst_ended() {
        let mut graph = ready_graph();
        graph.play_noise_burst(440.0).unwrap();

        // The buffer played out on its own
        graph
            .sink
            .nodes
            .retain(|_, n| !matches!(n, FakeNode::Buffer { .. }));

        graph.teardown();
        assert!(!graph.has_noise());
    }

    #[test]
    fn test_start_tone_resumes_suspended_context() {
        let mut graph = ready_graph();
        graph.suspend().unwrap();
        assert_eq!(graph.context_state(), ContextState::Suspended);

        graph.start_tone(440.0).unwrap();
        assert_eq!(graph.context_state(), ContextState::Running);
    }

    #[test]
    fn test_close() {
        let mut graph = ready_graph();
        graph.start_tone(440.0).unwrap();
        graph.close();

        assert!(!graph.is_initialized());
        assert!(!graph.has_tone());
        assert_eq!(graph.context_state(), ContextState::Closed);
        assert!(graph.sink().nodes.is_empty());

        // Reopens on the next gesture
        graph.initialize().unwrap();
        assert_eq!(graph.sink().open_calls, 2);
    }
}
