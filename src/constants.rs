//! Sample format and timing constants
//!
//! The ring, the latency planner and the output stream all agree on a single
//! sample layout: interleaved stereo, signed 16-bit, little-endian.

/// Channels per interleaved frame (stereo).
pub const CHANNELS: u16 = 2;

/// Bytes per stereo frame of 16-bit samples (left + right).
pub const BYTES_PER_SAMPLE: usize = 4;

/// Largest positive raw stick value reported by a gamepad axis.
pub const STICK_MAX: i16 = i16::MAX;

/// Magnitude of the most negative raw stick value.
pub const STICK_MIN_MAGNITUDE: f32 = 32768.0;

/// Headroom subtracted from the pacer's coarse sleep, in milliseconds.
/// Millisecond sleeps routinely overshoot by up to a scheduler quantum.
pub const DEFAULT_SLEEP_SAFETY_MARGIN_MS: f32 = 1.0;

/// Upper bound on the pacer's busy-wait, in milliseconds.
pub const DEFAULT_MAX_SPIN_MS: f32 = 3.0;

/// Accepted range for the target frame rate, in Hz.
pub const MIN_FRAME_RATE_HZ: f32 = 1.0;
pub const MAX_FRAME_RATE_HZ: f32 = 1000.0;

/// Largest accepted sleep margin or spin cap, in milliseconds.
pub const MAX_PACER_TUNABLE_MS: f32 = 1000.0;
