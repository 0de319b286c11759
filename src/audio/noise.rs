//! Noise burst synthesis
//!
//! A click on the pad plays a short burst of white noise shaped by the
//! current tone frequency: louder at higher pitches, with a periodic
//! wobble at 0.6x the frequency.

use std::f32::consts::TAU;

use rand::Rng;

use crate::mapping::{MAX_FREQUENCY, MIN_FREQUENCY};

/// Default burst length in seconds
pub const BURST_DURATION: f32 = 0.2;

/// How a burst is shaped
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BurstShape {
    /// Tone range the loudness is scaled over (Hz)
    pub min_frequency: f32,
    pub max_frequency: f32,
    /// Burst length in seconds
    pub duration: f32,
}

impl Default for BurstShape {
    fn default() -> Self {
        Self {
            min_frequency: MIN_FREQUENCY,
            max_frequency: MAX_FREQUENCY,
            duration: BURST_DURATION,
        }
    }
}

impl BurstShape {
    /// Position of `frequency` inside the tone range, clamped to 0.0..=1.0
    pub fn freq_factor(&self, frequency: f32) -> f32 {
        let span = self.max_frequency - self.min_frequency;
        if span <= 0.0 {
            return 0.0;
        }
        ((frequency - self.min_frequency) / span).clamp(0.0, 1.0)
    }

    /// Base amplitude of the noise for a given frequency (0.2 to 0.9)
    pub fn amplitude(&self, frequency: f32) -> f32 {
        0.2 + self.freq_factor(frequency) * 0.7
    }
}

/// Synthesize a noise burst
///
/// # Arguments
/// * `frequency` - Tone frequency the burst is shaped by (Hz)
/// * `shape` - Tone range and burst length
/// * `sample_rate` - Output sample rate (Hz)
/// * `rng` - Source of the noise
pub fn noise_burst<R: Rng>(
    frequency: f32,
    shape: &BurstShape,
    sample_rate: f32,
    rng: &mut R,
) -> Vec<f32> {
    let len = (sample_rate * shape.duration).round().max(0.0) as usize;
    let amplitude = shape.amplitude(frequency);
    let modulation_freq = frequency * 0.6;

    (0..len)
        .map(|i| {
            let noise: f32 = rng.random_range(-1.0..=1.0);
            let periodic = (TAU * i as f32 * modulation_freq / sample_rate).sin();
            noise * amplitude * (1.0 + periodic * 1.5)
        })
        .collect()
}
