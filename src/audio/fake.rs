//! In-memory [`AudioSink`] for tests

use std::collections::HashMap;

use super::sink::{AudioError, AudioSink, ContextState, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub enum FakeNode {
    Gain(f32),
    Oscillator { frequency: f32 },
    Buffer { len: usize, peak: f32 },
}

/// Records the graph instead of playing it
pub struct FakeSink {
    /// Whether the "platform" has audio at all
    pub available: bool,
    pub fail_start: bool,
    pub fail_set_frequency: bool,
    pub state: ContextState,
    pub open_calls: usize,
    pub time: f64,
    pub nodes: HashMap<NodeId, FakeNode>,
    /// Every (node, frequency, when) passed to `set_frequency_at`
    pub frequency_updates: Vec<(NodeId, f32, f64)>,
    next_id: u64,
}

impl Default for FakeSink {
    fn default() -> Self {
        Self {
            available: true,
            fail_start: false,
            fail_set_frequency: false,
            state: ContextState::Closed,
            open_calls: 0,
            time: 0.0,
            nodes: HashMap::new(),
            frequency_updates: Vec::new(),
            next_id: 0,
        }
    }
}

impl FakeSink {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn oscillators(&self) -> Vec<f32> {
        self.nodes
            .values()
            .filter_map(|n| match n {
                FakeNode::Oscillator { frequency } => Some(*frequency),
                _ => None,
            })
            .collect()
    }

    pub fn buffers(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n, FakeNode::Buffer { .. }))
            .count()
    }

    pub fn gains(&self) -> Vec<f32> {
        self.nodes
            .values()
            .filter_map(|n| match n {
                FakeNode::Gain(g) => Some(*g),
                _ => None,
            })
            .collect()
    }

    fn add(&mut self, node: FakeNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, node);
        id
    }

    fn check_open(&self) -> Result<(), AudioError> {
        if self.state == ContextState::Closed {
            Err(AudioError::Closed)
        } else {
            Ok(())
        }
    }

    fn check_gain(&self, node: NodeId) -> Result<(), AudioError> {
        match self.nodes.get(&node) {
            Some(FakeNode::Gain(_)) => Ok(()),
            _ => Err(AudioError::UnknownNode(node)),
        }
    }
}

impl AudioSink for FakeSink {
    fn open(&mut self) -> Result<(), AudioError> {
        self.open_calls += 1;
        if !self.available {
            return Err(AudioError::NoOutputDevice);
        }
        if self.state == ContextState::Closed {
            self.state = ContextState::Suspended;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.check_open()?;
        self.state = ContextState::Running;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        self.check_open()?;
        self.state = ContextState::Suspended;
        Ok(())
    }

    fn close(&mut self) -> Result<(), AudioError> {
        self.state = ContextState::Closed;
        self.nodes.clear();
        Ok(())
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn sample_rate(&self) -> f32 {
        48000.0
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError> {
        self.check_open()?;
        Ok(self.add(FakeNode::Gain(gain)))
    }

    fn start_oscillator(
        &mut self,
        frequency: f32,
        destination: NodeId,
    ) -> Result<NodeId, AudioError> {
        self.check_open()?;
        self.check_gain(destination)?;
        if self.fail_start {
            return Err(AudioError::UnknownNode(destination));
        }
        Ok(self.add(FakeNode::Oscillator { frequency }))
    }

    fn set_frequency_at(
        &mut self,
        node: NodeId,
        frequency: f32,
        when: f64,
    ) -> Result<(), AudioError> {
        self.check_open()?;
        if self.fail_set_frequency {
            return Err(AudioError::UnknownNode(node));
        }
        match self.nodes.get_mut(&node) {
            Some(FakeNode::Oscillator { frequency: f }) => {
                *f = frequency;
                self.frequency_updates.push((node, frequency, when));
                Ok(())
            }
            _ => Err(AudioError::UnknownNode(node)),
        }
    }

    fn start_buffer(
        &mut self,
        samples: Vec<f32>,
        destination: NodeId,
    ) -> Result<NodeId, AudioError> {
        self.check_open()?;
        self.check_gain(destination)?;
        if self.fail_start {
            return Err(AudioError::UnknownNode(destination));
        }
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        Ok(self.add(FakeNode::Buffer {
            len: samples.len(),
            peak,
        }))
    }

    fn stop(&mut self, node: NodeId) -> Result<(), AudioError> {
        match self.nodes.get(&node) {
            Some(FakeNode::Oscillator { .. }) | Some(FakeNode::Buffer { .. }) => {
                self.nodes.remove(&node);
                Ok(())
            }
            _ => Err(AudioError::AlreadyStopped(node)),
        }
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), AudioError> {
        self.check_gain(node)?;
        self.nodes.remove(&node);
        Ok(())
    }
}
