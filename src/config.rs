//! Configuration for the lockstep platform loop.
//!
//! Every section has sensible defaults, so a TOML file only needs to name the
//! values it overrides:
//!
//! ```toml
//! [audio]
//! samples_per_second = 44100
//!
//! [timing]
//! target_frame_rate = "60hz"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    BYTES_PER_SAMPLE, DEFAULT_MAX_SPIN_MS, DEFAULT_SLEEP_SAFETY_MARGIN_MS, MAX_FRAME_RATE_HZ,
    MAX_PACER_TUNABLE_MS, MIN_FRAME_RATE_HZ, STICK_MAX,
};
use crate::error::{LockstepError, Result};

/// Target frame rate of the simulation loop
///
/// Can be specified as either a rate in Hz or a frame period in milliseconds.
///
/// # Parsing formats
/// - `30` - rate in Hz (no suffix)
/// - `30hz` or `30Hz` - rate in Hz (explicit)
/// - `33.3ms` - frame period in milliseconds
///
/// # Example
/// ```
/// use lockstep::config::FrameRate;
///
/// let rate: FrameRate = "16.667ms".parse().unwrap();
/// assert!((rate.as_hz() - 60.0).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "FrameRateRepr")]
pub struct FrameRate(f32);

impl FrameRate {
    /// Create from a rate in Hz
    pub fn from_hz(hz: f32) -> Self {
        Self(hz)
    }

    /// Create from a frame period in milliseconds
    pub fn from_period_ms(ms: f32) -> Self {
        Self(1000.0 / ms)
    }

    /// Get rate in Hz
    pub fn as_hz(&self) -> f32 {
        self.0
    }

    /// Wall-clock budget of one frame
    ///
    /// Saturates at `Duration::MAX` for rates too small to represent;
    /// `PlatformConfig::validate` rejects those.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.0 as f64).unwrap_or(Duration::MAX)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::from_hz(30.0)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}hz", self.0)
    }
}

impl FromStr for FrameRate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s.strip_suffix("ms") {
            let ms: f32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid frame period: {}", s))?;
            if !(ms > 0.0 && ms.is_finite()) {
                return Err("frame period must be positive".to_string());
            }
            return Ok(Self::from_period_ms(ms));
        }

        let num = s
            .strip_suffix("hz")
            .or_else(|| s.strip_suffix("Hz"))
            .or_else(|| s.strip_suffix("HZ"))
            .unwrap_or(s);

        let hz: f32 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid frame rate: {}", s))?;
        if !(hz > 0.0 && hz.is_finite()) {
            return Err("frame rate must be positive".to_string());
        }
        Ok(Self::from_hz(hz))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FrameRateRepr {
    Hz(f32),
    Text(String),
}

impl TryFrom<FrameRateRepr> for FrameRate {
    type Error = String;

    fn try_from(repr: FrameRateRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            FrameRateRepr::Hz(hz) if hz > 0.0 && hz.is_finite() => Ok(Self::from_hz(hz)),
            FrameRateRepr::Hz(hz) => Err(format!("frame rate must be positive (got {})", hz)),
            FrameRateRepr::Text(text) => text.parse(),
        }
    }
}

/// Complete platform configuration
///
/// Use `PlatformConfig::default()` for a 48 kHz / 30 fps setup with four
/// gamepad slots.
///
/// # Example
/// ```
/// use lockstep::config::{FrameRate, PlatformConfig};
///
/// let mut config = PlatformConfig::default();
/// config.timing.target_frame_rate = FrameRate::from_hz(60.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    /// Audio output and ring buffer configuration
    pub audio: AudioConfig,
    /// Frame pacing configuration
    pub timing: TimingConfig,
    /// Input state configuration
    pub input: InputConfig,
}

/// Audio output configuration
///
/// The ring buffer always holds one second of audio, so its capacity follows
/// directly from the sample rate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Output sample rate in Hz (frames per second)
    pub samples_per_second: u32,
    /// Frames the device requests per callback (hint, backend may ignore it)
    pub device_buffer_frames: u32,
    /// Latency look-ahead as a fraction of one second (15 means 1/15 s)
    pub latency_divisor: u32,
}

/// Frame pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Simulation frame rate
    pub target_frame_rate: FrameRate,
    /// Time left unslept before the spin-wait takes over, in milliseconds
    pub sleep_safety_margin_ms: f32,
    /// Cap on the spin-wait duration, in milliseconds
    pub max_spin_ms: f32,
}

/// Input state configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Number of gamepad slots (the keyboard slot is always present)
    pub max_controllers: usize,
    /// Raw stick magnitude treated as centered
    pub stick_deadzone: i16,
}

impl AudioConfig {
    /// Bytes per interleaved stereo frame
    pub fn bytes_per_sample(&self) -> usize {
        BYTES_PER_SAMPLE
    }

    /// Ring capacity in bytes: one second of audio
    pub fn secondary_buffer_size(&self) -> usize {
        self.samples_per_second as usize * BYTES_PER_SAMPLE
    }

    /// Number of frames the producer keeps ahead of the play cursor
    pub fn latency_sample_count(&self) -> usize {
        (self.samples_per_second / self.latency_divisor.max(1)) as usize
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            samples_per_second: 48000,
            device_buffer_frames: 512,
            latency_divisor: 15,
        }
    }
}

impl TimingConfig {
    pub fn sleep_safety_margin(&self) -> Duration {
        millis_f32(self.sleep_safety_margin_ms)
    }

    pub fn max_spin(&self) -> Duration {
        millis_f32(self.max_spin_ms)
    }
}

/// Negative and NaN clamp to zero, out-of-range values saturate
fn millis_f32(ms: f32) -> Duration {
    Duration::try_from_secs_f32(ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX)
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_frame_rate: FrameRate::default(),
            sleep_safety_margin_ms: DEFAULT_SLEEP_SAFETY_MARGIN_MS,
            max_spin_ms: DEFAULT_MAX_SPIN_MS,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_controllers: 4,
            // XInput's recommended left thumbstick dead zone
            stick_deadzone: 7849,
        }
    }
}

impl PlatformConfig {
    /// Parse a TOML document, falling back to defaults for missing values
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Check that the tunables describe a usable setup
    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        if audio.samples_per_second == 0 {
            return Err(LockstepError::Config(
                "samples_per_second must be positive".into(),
            ));
        }
        if audio.device_buffer_frames == 0 {
            return Err(LockstepError::Config(
                "device_buffer_frames must be positive".into(),
            ));
        }
        if audio.latency_divisor < 2 {
            return Err(LockstepError::Config(format!(
                "latency_divisor must be at least 2 (got {}), the look-ahead has to fit in the ring",
                audio.latency_divisor
            )));
        }
        if audio.latency_sample_count() == 0 {
            return Err(LockstepError::Config(format!(
                "latency of 1/{} s rounds to zero samples at {} Hz",
                audio.latency_divisor, audio.samples_per_second
            )));
        }

        let timing = &self.timing;
        let hz = timing.target_frame_rate.as_hz();
        if !(MIN_FRAME_RATE_HZ..=MAX_FRAME_RATE_HZ).contains(&hz) {
            return Err(LockstepError::Config(format!(
                "target_frame_rate must be in [{}, {}] Hz (got {})",
                MIN_FRAME_RATE_HZ, MAX_FRAME_RATE_HZ, hz
            )));
        }
        for (name, value) in [
            ("sleep_safety_margin_ms", timing.sleep_safety_margin_ms),
            ("max_spin_ms", timing.max_spin_ms),
        ] {
            if !(0.0..=MAX_PACER_TUNABLE_MS).contains(&value) {
                return Err(LockstepError::Config(format!(
                    "{} must be in [0, {}] (got {})",
                    name, MAX_PACER_TUNABLE_MS, value
                )));
            }
        }
        // Sleeps truncate to whole milliseconds, so the spin may have to cover
        // the margin plus up to 1ms more.
        if timing.max_spin_ms < timing.sleep_safety_margin_ms + 1.0 {
            return Err(LockstepError::Config(format!(
                "max_spin_ms ({}) must be at least sleep_safety_margin_ms + 1 ({})",
                timing.max_spin_ms,
                timing.sleep_safety_margin_ms + 1.0
            )));
        }

        let input = &self.input;
        if input.max_controllers == 0 {
            return Err(LockstepError::Config(
                "max_controllers must be at least 1".into(),
            ));
        }
        if input.stick_deadzone < 0 || input.stick_deadzone == STICK_MAX {
            return Err(LockstepError::Config(format!(
                "stick_deadzone must be in [0, {}) (got {})",
                STICK_MAX, input.stick_deadzone
            )));
        }

        Ok(())
    }

    /// Audio frames the simulation advances per video frame
    pub fn samples_per_frame(&self) -> f64 {
        self.audio.samples_per_second as f64 / self.timing.target_frame_rate.as_hz() as f64
    }
}
