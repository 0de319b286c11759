//! Speed-to-frequency mapping
//!
//! Pointer speed (pixels per second) is mapped linearly onto the tone
//! frequency and clamped to an audible range.

/// Lowest tone frequency (A3)
pub const MIN_FREQUENCY: f32 = 220.0;

/// Highest tone frequency (A5)
pub const MAX_FREQUENCY: f32 = 880.0;

/// Hz added per px/s of pointer speed
pub const SPEED_MULTIPLIER: f32 = 1.5;

/// One mapped pointer movement, kept for the debug readout
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    /// Distance travelled since the previous sample (px)
    pub distance: f32,
    /// Pointer speed (px/s)
    pub speed: f32,
    /// Resulting tone frequency (Hz)
    pub frequency: f32,
}

/// Maps (distance, elapsed time) to a tone frequency
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyMapper {
    pub min_frequency: f32,
    pub max_frequency: f32,
    pub speed_multiplier: f32,
}

impl Default for FrequencyMapper {
    fn default() -> Self {
        Self {
            min_frequency: MIN_FREQUENCY,
            max_frequency: MAX_FREQUENCY,
            speed_multiplier: SPEED_MULTIPLIER,
        }
    }
}

impl FrequencyMapper {
    /// Pointer speed in px/s. Zero if no time has passed.
    pub fn speed(distance: f32, elapsed_ms: f64) -> f32 {
        let seconds = elapsed_ms / 1000.0;
        if seconds > 0.0 {
            (distance as f64 / seconds) as f32
        } else {
            0.0
        }
    }

    /// Frequency for a given speed, clamped to the configured range
    pub fn frequency_for_speed(&self, speed: f32) -> f32 {
        let frequency = self.min_frequency + speed * self.speed_multiplier;
        frequency.clamp(self.min_frequency, self.max_frequency)
    }

    /// Map a movement to a full reading
    pub fn map(&self, distance: f32, elapsed_ms: f64) -> Reading {
        let speed = Self::speed(distance, elapsed_ms);
        Reading {
            distance,
            speed,
            frequency: self.frequency_for_speed(speed),
        }
    }
}
