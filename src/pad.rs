//! Sound pad - the interactive region and its state machine
//!
//! Hovering the pad starts a tone, moving over it bends the pitch with
//! pointer speed, leaving it silences everything, and clicking fires a
//! noise burst.
//!
//! ```text
//! Uninitialized --enter--> Playing --leave--> Idle --enter--> Playing ...
//!        ^                                                       |
//!        +------------------------ dispose ----------------------+
//! ```

use crate::audio::{AudioError, AudioGraph, AudioSink, ContextState, GraphConfig};
use crate::mapping::{FrequencyMapper, Reading};
use crate::motion::{MotionTracker, Position};

/// Tone frequency before the pointer has moved (A4)
pub const INITIAL_FREQUENCY: f32 = 440.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadState {
    /// No audio context yet (or disposed)
    Uninitialized,
    /// Context open, no tone
    Idle,
    /// Context open, tone playing
    Playing,
}

/// Input events the pad reacts to. Timestamps are in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PadEvent {
    Enter { position: Position, timestamp_ms: f64 },
    Move { position: Position, timestamp_ms: f64 },
    Leave,
    Click,
    FocusLost,
}

/// Collapse one frame's pointer positions into a single move
///
/// Every position in a frame carries the frame's timestamp, so only the
/// latest one is sampled; it then covers the whole time since the last frame.
pub fn frame_move<I>(positions: I, timestamp_ms: f64) -> Option<PadEvent>
where
    I: IntoIterator<Item = Position>,
{
    positions
        .into_iter()
        .last()
        .map(|position| PadEvent::Move {
            position,
            timestamp_ms,
        })
}

pub struct SoundPad<S: AudioSink> {
    graph: AudioGraph<S>,
    tracker: MotionTracker,
    pub mapper: FrequencyMapper,
    /// Last frequency sent to the oscillator
    last_frequency: f32,
    /// Last mapped movement, for display
    reading: Reading,
    /// Set when the platform has no audio; the pad stays silent afterwards
    audio_unavailable: bool,
}

impl<S: AudioSink> SoundPad<S> {
    pub fn new(
        sink: S,
        config: GraphConfig,
        mapper: FrequencyMapper,
        initial_frequency: f32,
    ) -> Self {
        Self {
            graph: AudioGraph::new(sink, config),
            tracker: MotionTracker::new(),
            mapper,
            last_frequency: initial_frequency,
            reading: Reading {
                frequency: initial_frequency,
                ..Reading::default()
            },
            audio_unavailable: false,
        }
    }

    pub fn state(&self) -> PadState {
        if !self.graph.is_initialized() {
            PadState::Uninitialized
        } else if self.graph.has_tone() {
            PadState::Playing
        } else {
            PadState::Idle
        }
    }

    #[cfg(test)]
    pub fn graph(&self) -> &AudioGraph<S> {
        &self.graph
    }

    pub fn reading(&self) -> Reading {
        self.reading
    }

    #[cfg(test)]
    pub fn last_frequency(&self) -> f32 {
        self.last_frequency
    }

    pub fn audio_unavailable(&self) -> bool {
        self.audio_unavailable
    }

    pub fn handle(&mut self, event: PadEvent) {
        match event {
            PadEvent::Enter {
                position,
                timestamp_ms,
            } => self.pointer_enter(position, timestamp_ms),
            PadEvent::Move {
                position,
                timestamp_ms,
            } => self.pointer_move(position, timestamp_ms),
            PadEvent::Leave => self.pointer_leave(),
            PadEvent::Click => self.click(),
            PadEvent::FocusLost => self.focus_lost(),
        }
    }

    /// Start a tone, initializing audio on first use
    pub fn pointer_enter(&mut self, position: Position, timestamp_ms: f64) {
        self.graph.teardown();
        self.tracker.prime(position, timestamp_ms);

        if self.audio_unavailable {
            return;
        }

        if !self.graph.is_initialized() {
            if let Err(e) = self.graph.initialize() {
                log::error!("Audio unavailable, pad disabled: {}", e);
                self.audio_unavailable = true;
                return;
            }
        }

        if let Err(e) = self.graph.start_tone(self.last_frequency) {
            self.fail("starting sound", e);
        }
    }

    /// Bend the tone with pointer speed
    pub fn pointer_move(&mut self, position: Position, timestamp_ms: f64) {
        if self.state() != PadState::Playing
            || self.graph.context_state() != ContextState::Running
        {
            return;
        }

        let Some(motion) = self.tracker.observe(position, timestamp_ms) else {
            return;
        };

        let reading = self.mapper.map(motion.distance, motion.elapsed_ms);
        match self.graph.set_frequency(reading.frequency) {
            Ok(()) => {
                self.last_frequency = reading.frequency;
                self.reading = reading;
                log::debug!(
                    "{:.0}px in {:.0}ms -> {:.0}px/s -> {:.1}Hz",
                    reading.distance,
                    motion.elapsed_ms,
                    reading.speed,
                    reading.frequency
                );
            }
            Err(e) => self.fail("updating frequency", e),
        }
    }

    /// Silence everything
    pub fn pointer_leave(&mut self) {
        self.graph.teardown();
        self.tracker.reset();
    }

    /// Fire a noise burst at the current pitch
    pub fn click(&mut self) {
        if !self.graph.is_initialized() {
            return;
        }
        if let Err(e) = self.graph.play_noise_burst(self.last_frequency) {
            self.fail("playing noise", e);
        }
    }

    /// Silence and pause the context while the window is in the background
    pub fn focus_lost(&mut self) {
        self.pointer_leave();
        if let Err(e) = self.graph.suspend() {
            log::warn!("Failed to suspend audio: {}", e);
        }
    }

    /// Release all audio resources
    pub fn dispose(&mut self) {
        self.pointer_leave();
        self.graph.close();
    }

    /// Any failure while sounding falls back to silence
    fn fail(&mut self, what: &str, error: AudioError) {
        log::error!("Error {}: {}", what, error);
        self.pointer_leave();
    }
}
