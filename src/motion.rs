//! Pointer motion tracking
//!
//! Keeps only the last pointer sample. Each new sample is compared with it
//! to get the distance travelled and the time it took.

/// A pointer position in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Last known pointer state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSample {
    pub position: Position,
    /// Timestamp in milliseconds
    pub timestamp_ms: f64,
}

/// Displacement between two consecutive samples
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Pixels
    pub distance: f32,
    /// Milliseconds
    pub elapsed_ms: f64,
}

#[derive(Debug, Default)]
pub struct MotionTracker {
    last: Option<MotionSample>,
}

impl MotionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a starting sample without producing any motion
    pub fn prime(&mut self, position: Position, timestamp_ms: f64) {
        self.last = Some(MotionSample {
            position,
            timestamp_ms,
        });
    }

    /// Record a new sample and return the motion since the previous one
    ///
    /// Returns `None` for the first sample, and for samples with no
    /// movement or no elapsed time. The sample is recorded either way.
    pub fn observe(&mut self, position: Position, timestamp_ms: f64) -> Option<Motion> {
        let previous = self.last.replace(MotionSample {
            position,
            timestamp_ms,
        })?;

        let distance = position.distance(previous.position);
        let elapsed_ms = timestamp_ms - previous.timestamp_ms;

        if distance > 0.0 && elapsed_ms > 0.0 {
            Some(Motion {
                distance,
                elapsed_ms,
            })
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<MotionSample> {
        self.last
    }

    /// Forget the last sample
    pub fn reset(&mut self) {
        self.last = None;
    }
}
