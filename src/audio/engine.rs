//! Audio engine - cpal implementation of [`AudioSink`]
//!
//! The UI thread edits a small software mixer (gain nodes plus voices) and
//! the cpal callback renders it. Voices are either sine oscillators or
//! one-shot sample buffers.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample};
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

use super::sink::{AudioError, AudioSink, ContextState, NodeId};

/// What a voice plays
enum Source {
    Sine {
        frequency: f32,
        /// Phase in cycles (0.0 to 1.0)
        phase: f32,
        /// Scheduled frequency changes: (frame, frequency), sorted by frame
        pending: Vec<(u64, f32)>,
    },
    Buffer {
        samples: Vec<f32>,
        position: usize,
    },
}

struct Voice {
    id: NodeId,
    destination: NodeId,
    source: Source,
}

impl Voice {
    fn finished(&self) -> bool {
        match &self.source {
            Source::Sine { .. } => false,
            Source::Buffer { samples, position } => *position >= samples.len(),
        }
    }

    /// Produce the next sample and advance
    fn next_sample(&mut self, frame: u64, sample_rate: f32) -> f32 {
        match &mut self.source {
            Source::Sine {
                frequency,
                phase,
                pending,
            } => {
                while let Some(&(at, freq)) = pending.first() {
                    if at > frame {
                        break;
                    }
                    *frequency = freq;
                    pending.remove(0);
                }
                let out = (*phase * TAU).sin();
                *phase = (*phase + *frequency / sample_rate).fract();
                out
            }
            Source::Buffer { samples, position } => {
                let out = samples.get(*position).copied().unwrap_or(0.0);
                *position += 1;
                out
            }
        }
    }
}

/// Gain nodes and voices shared with the audio thread
#[derive(Default)]
struct Mixer {
    /// Gain nodes connected to the destination
    gains: Vec<(NodeId, f32)>,
    voices: Vec<Voice>,
}

impl Mixer {
    fn gain(&self, node: NodeId) -> Option<f32> {
        self.gains.iter().find(|(id, _)| *id == node).map(|(_, g)| *g)
    }

    fn voice_mut(&mut self, node: NodeId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.id == node)
    }

    /// Render one mono frame, dropping buffers that have run out
    fn render_frame(&mut self, frame: u64, sample_rate: f32) -> f32 {
        let mut mix = 0.0;
        for i in 0..self.voices.len() {
            let gain = self.gain(self.voices[i].destination);
            let sample = self.voices[i].next_sample(frame, sample_rate);
            // Voices whose gain node is gone keep running but are not heard
            if let Some(gain) = gain {
                mix += sample * gain;
            }
        }
        self.voices.retain(|v| !v.finished());
        mix
    }

    fn clear(&mut self) {
        self.gains.clear();
        self.voices.clear();
    }
}

/// Write audio samples for any sample format
fn write_audio_samples<T: Sample + FromSample<f32>>(
    data: &mut [T],
    channels: usize,
    mixer: &Mutex<Mixer>,
    frames_rendered: &AtomicU64,
    sample_rate: f32,
) {
    let num_frames = data.len() / channels;
    let start_frame = frames_rendered.load(Ordering::Relaxed);

    // Never block the audio thread; output silence if the UI holds the lock
    let mut mixer = match mixer.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => {
            for sample in data.iter_mut() {
                *sample = T::EQUILIBRIUM;
            }
            frames_rendered.fetch_add(num_frames as u64, Ordering::Relaxed);
            return;
        }
    };

    for (frame_num, frame) in data.chunks_mut(channels).enumerate() {
        let value = mixer.render_frame(start_frame + frame_num as u64, sample_rate);
        let value = T::from_sample(value);
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }

    frames_rendered.fetch_add(num_frames as u64, Ordering::Relaxed);
}

/// Build an output stream rendering `mixer` in the given sample format
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
    frames_rendered: Arc<AtomicU64>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0 as f32;
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            write_audio_samples(data, channels, &mixer, &frames_rendered, sample_rate);
        },
        |err| log::error!("Audio stream error: {}", err),
        None,
    )
}

/// [`AudioSink`] rendering to the default cpal output device
pub struct CpalSink {
    /// The output stream (kept alive while the context is open)
    stream: Option<cpal::Stream>,

    /// Whether the stream is currently playing
    running: bool,

    /// Gain nodes and voices shared with the audio thread
    mixer: Arc<Mutex<Mixer>>,

    /// Frames rendered since the context was opened (for context time)
    frames_rendered: Arc<AtomicU64>,

    /// Sample rate of the output device
    sample_rate: f32,

    next_id: u64,
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalSink {
    pub fn new() -> Self {
        Self {
            stream: None,
            running: false,
            mixer: Arc::new(Mutex::new(Mixer::default())),
            frames_rendered: Arc::new(AtomicU64::new(0)),
            sample_rate: 48000.0,
            next_id: 0,
        }
    }

    fn alloc_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    fn ensure_open(&self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            Ok(())
        } else {
            Err(AudioError::Closed)
        }
    }

    /// Run `f` with the mixer locked
    fn with_mixer<R>(&self, f: impl FnOnce(&mut Mixer) -> R) -> R {
        // Poisoned only if a holder panicked; the mixer is still valid
        let mut mixer = match self.mixer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut mixer)
    }

    fn time_to_frame(&self, when: f64) -> u64 {
        (when.max(0.0) * self.sample_rate as f64).round() as u64
    }
}

impl AudioSink for CpalSink {
    fn open(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }

        log::info!("Opening audio context...");

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            log::error!("No output device found");
            AudioError::NoOutputDevice
        })?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Using output device: {}", device_name);

        let supported = device.default_output_config()?;
        log::info!("Audio config: {:?}", supported);

        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        self.sample_rate = config.sample_rate.0 as f32;
        self.frames_rendered.store(0, Ordering::Relaxed);

        let mixer = Arc::clone(&self.mixer);
        let frames = Arc::clone(&self.frames_rendered);
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer, frames)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer, frames)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer, frames)?,
            format => {
                log::error!("Unsupported sample format: {:?}", format);
                return Err(AudioError::UnsupportedFormat(format));
            }
        };

        // Some backends start streams on creation; start suspended like a
        // fresh context and let the caller resume.
        if let Err(e) = stream.pause() {
            log::debug!("Could not pause new stream: {}", e);
        }

        self.stream = Some(stream);
        self.running = false;
        log::info!("Audio context open at {} Hz", self.sample_rate);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let stream = self.stream.as_ref().ok_or(AudioError::Closed)?;
        if !self.running {
            stream.play()?;
            self.running = true;
            log::debug!("Audio context resumed");
        }
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        let stream = self.stream.as_ref().ok_or(AudioError::Closed)?;
        if self.running {
            stream.pause()?;
            self.running = false;
            log::debug!("Audio context suspended");
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), AudioError> {
        if self.stream.take().is_some() {
            self.running = false;
            self.with_mixer(Mixer::clear);
            log::info!("Audio context closed");
        }
        Ok(())
    }

    fn state(&self) -> ContextState {
        match (&self.stream, self.running) {
            (None, _) => ContextState::Closed,
            (Some(_), false) => ContextState::Suspended,
            (Some(_), true) => ContextState::Running,
        }
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.frames_rendered.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError> {
        self.ensure_open()?;
        let id = self.alloc_id();
        self.with_mixer(|m| m.gains.push((id, gain)));
        Ok(id)
    }

    fn start_oscillator(
        &mut self,
        frequency: f32,
        destination: NodeId,
    ) -> Result<NodeId, AudioError> {
        self.ensure_open()?;
        let id = self.alloc_id();
        self.with_mixer(|m| {
            if m.gain(destination).is_none() {
                return Err(AudioError::UnknownNode(destination));
            }
            m.voices.push(Voice {
                id,
                destination,
                source: Source::Sine {
                    frequency,
                    phase: 0.0,
                    pending: Vec::new(),
                },
            });
            Ok(id)
        })
    }

    fn set_frequency_at(
        &mut self,
        node: NodeId,
        frequency: f32,
        when: f64,
    ) -> Result<(), AudioError> {
        self.ensure_open()?;
        let frame = self.time_to_frame(when);
        self.with_mixer(|m| match m.voice_mut(node).map(|v| &mut v.source) {
            Some(Source::Sine { pending, .. }) => {
                let at = pending.partition_point(|&(f, _)| f <= frame);
                pending.insert(at, (frame, frequency));
                Ok(())
            }
            Some(Source::Buffer { .. }) | None => Err(AudioError::UnknownNode(node)),
        })
    }

    fn start_buffer(
        &mut self,
        samples: Vec<f32>,
        destination: NodeId,
    ) -> Result<NodeId, AudioError> {
        self.ensure_open()?;
        let id = self.alloc_id();
        self.with_mixer(|m| {
            if m.gain(destination).is_none() {
                return Err(AudioError::UnknownNode(destination));
            }
            m.voices.push(Voice {
                id,
                destination,
                source: Source::Buffer {
                    samples,
                    position: 0,
                },
            });
            Ok(id)
        })
    }

    fn stop(&mut self, node: NodeId) -> Result<(), AudioError> {
        self.with_mixer(|m| {
            let before = m.voices.len();
            m.voices.retain(|v| v.id != node);
            if m.voices.len() < before {
                Ok(())
            } else {
                Err(AudioError::AlreadyStopped(node))
            }
        })
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), AudioError> {
        self.with_mixer(|m| {
            let before = m.gains.len();
            m.gains.retain(|(id, _)| *id != node);
            if m.gains.len() < before {
                Ok(())
            } else {
                Err(AudioError::UnknownNode(node))
            }
        })
    }
}
