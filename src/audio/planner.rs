use crate::config::AudioConfig;

/// Byte window the producer fills during one frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SoundOutputPlan {
    /// Where the producer resumes writing, derived from its running sample count
    pub byte_to_lock: usize,
    /// Play cursor plus the latency look-ahead, wrapped to the ring
    pub target_cursor: usize,
    /// Forward distance from `byte_to_lock` to `target_cursor`
    pub bytes_to_write: usize,
}

/// Decides how much audio the producer synthesizes each frame
///
/// The backend cannot report true playback position, so the target is
/// anchored to the last known play cursor plus a fixed look-ahead
/// (`latency_sample_count`). That one constant bounds both the audible delay
/// and the underrun risk.
#[derive(Debug, Clone)]
pub struct LatencyPlanner {
    running_sample_index: u64,
    bytes_per_sample: usize,
    secondary_buffer_size: usize,
    latency_sample_count: usize,
}

impl LatencyPlanner {
    pub fn new(config: &AudioConfig) -> Self {
        Self::with_geometry(
            config.bytes_per_sample(),
            config.secondary_buffer_size(),
            config.latency_sample_count(),
        )
    }

    /// Create a planner for an explicit ring geometry
    ///
    /// # Arguments
    /// * `bytes_per_sample` - Bytes per interleaved stereo frame
    /// * `secondary_buffer_size` - Ring capacity in bytes
    /// * `latency_sample_count` - Frames to stay ahead of the play cursor
    pub fn with_geometry(
        bytes_per_sample: usize,
        secondary_buffer_size: usize,
        latency_sample_count: usize,
    ) -> Self {
        assert!(bytes_per_sample > 0 && secondary_buffer_size > 0);
        Self {
            running_sample_index: 0,
            bytes_per_sample,
            secondary_buffer_size,
            latency_sample_count,
        }
    }

    /// Compute this frame's write window from a snapshot of the play cursor
    pub fn plan(&self, play_cursor: usize) -> SoundOutputPlan {
        let byte_to_lock = ((self.running_sample_index % self.ring_samples())
            * self.bytes_per_sample as u64) as usize;
        plan_window(
            byte_to_lock,
            play_cursor,
            self.latency_bytes(),
            self.secondary_buffer_size,
        )
    }

    /// Number of whole frames covered by `plan`
    pub fn samples_to_write(&self, plan: &SoundOutputPlan) -> usize {
        plan.bytes_to_write / self.bytes_per_sample
    }

    /// Record that `samples` frames were written to the ring
    pub fn advance(&mut self, samples: usize) {
        self.running_sample_index = self.running_sample_index.wrapping_add(samples as u64);
    }

    pub fn running_sample_index(&self) -> u64 {
        self.running_sample_index
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    pub fn secondary_buffer_size(&self) -> usize {
        self.secondary_buffer_size
    }

    pub fn latency_bytes(&self) -> usize {
        self.latency_sample_count * self.bytes_per_sample
    }

    fn ring_samples(&self) -> u64 {
        (self.secondary_buffer_size / self.bytes_per_sample).max(1) as u64
    }
}

/// Wrap-aware write window between `byte_to_lock` and `play_cursor + latency_bytes`
///
/// When the two positions coincide the window is empty: the producer is
/// already exactly `latency_bytes` ahead and writes nothing this frame.
pub fn plan_window(
    byte_to_lock: usize,
    play_cursor: usize,
    latency_bytes: usize,
    capacity: usize,
) -> SoundOutputPlan {
    let byte_to_lock = byte_to_lock % capacity;
    let target_cursor = (play_cursor % capacity + latency_bytes % capacity) % capacity;

    let bytes_to_write = if byte_to_lock > target_cursor {
        capacity - byte_to_lock + target_cursor
    } else {
        target_cursor - byte_to_lock
    };

    SoundOutputPlan {
        byte_to_lock,
        target_cursor,
        bytes_to_write,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_from_start() {
        let planner = LatencyPlanner::with_geometry(4, 192_000, 3200);
        let plan = planner.plan(0);
        assert_eq!(plan.byte_to_lock, 0);
        assert_eq!(plan.target_cursor, 12_800);
        assert_eq!(plan.bytes_to_write, 12_800);
        assert_eq!(planner.samples_to_write(&plan), 3200);
    }

    #[test]
    fn test_equal_positions_write_nothing() {
        let plan = plan_window(1000, 600, 400, 4000);
        assert_eq!(plan.target_cursor, 1000);
        assert_eq!(plan.bytes_to_write, 0);
    }

    #[test]
    fn test_lock_ahead_of_target_wraps() {
        let plan = plan_window(3900, 0, 200, 4000);
        assert_eq!(plan.target_cursor, 200);
        assert_eq!(plan.bytes_to_write, 300);
    }

    #[test]
    fn test_advance_moves_byte_to_lock() {
        let mut planner = LatencyPlanner::with_geometry(4, 4000, 100);
        planner.advance(100);
        assert_eq!(planner.plan(0).byte_to_lock, 400);
        assert_eq!(planner.plan(0).bytes_to_write, 0);

        planner.advance(950);
        assert_eq!(planner.running_sample_index(), 1050);
        assert_eq!(planner.plan(0).byte_to_lock, 200);
    }

    #[test]
    fn test_default_config_latency() {
        let planner = LatencyPlanner::new(&AudioConfig::default());
        assert_eq!(planner.latency_bytes(), 12_800);
        assert_eq!(planner.secondary_buffer_size(), 192_000);
    }
}
