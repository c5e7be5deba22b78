use std::sync::Arc;

use super::planner::{LatencyPlanner, SoundOutputPlan};
use super::ring::{CursorSnapshot, SampleRing};
use super::synth::{SoundSynthesizer, StereoFrame};
use crate::error::Result;

/// Outcome of one producer step
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FillReport {
    /// Cursor snapshot the plan was computed from
    pub cursors: CursorSnapshot,
    pub plan: SoundOutputPlan,
    /// Frames synthesized and written this step
    pub samples_written: usize,
}

/// Producer side of the ring: plans, synthesizes and writes one frame's audio
pub struct SoundProducer {
    ring: Arc<SampleRing>,
    planner: LatencyPlanner,
    scratch: Vec<StereoFrame>,
    bytes: Vec<u8>,
    written: usize,
}

impl SoundProducer {
    pub fn new(ring: Arc<SampleRing>, planner: LatencyPlanner) -> Self {
        debug_assert_eq!(ring.capacity(), planner.secondary_buffer_size());
        let capacity = ring.capacity();
        let max_samples = capacity / planner.bytes_per_sample();
        Self {
            ring,
            planner,
            scratch: Vec::with_capacity(max_samples),
            bytes: Vec::with_capacity(capacity),
            written: 0,
        }
    }

    /// Top the ring up to `play_cursor + latency`
    ///
    /// The cursor lock is held only while the snapshot is taken; the
    /// synthesized bytes are written without it.
    pub fn fill<S: SoundSynthesizer + ?Sized>(&mut self, synth: &mut S) -> Result<FillReport> {
        let cursors = self.ring.cursors();
        let plan = self.planner.plan(cursors.play_cursor);
        let samples = self.planner.samples_to_write(&plan);

        self.scratch.clear();
        self.scratch.resize(samples, StereoFrame::default());
        synth.synthesize(&mut self.scratch);

        self.bytes.clear();
        self.bytes
            .extend(self.scratch.iter().flat_map(|frame| frame.to_le_bytes()));
        self.ring.write(plan.byte_to_lock, &self.bytes)?;

        self.planner.advance(samples);
        self.written = samples;

        Ok(FillReport {
            cursors,
            plan,
            samples_written: samples,
        })
    }

    /// Frames produced by the most recent `fill`
    pub fn last_frames(&self) -> &[StereoFrame] {
        &self.scratch[..self.written]
    }

    pub fn planner(&self) -> &LatencyPlanner {
        &self.planner
    }

    pub fn ring(&self) -> &Arc<SampleRing> {
        &self.ring
    }
}
