use std::f32::consts::TAU;

/// Interleaved stereo frame of signed 16-bit samples
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StereoFrame {
    pub left: i16,
    pub right: i16,
}

impl StereoFrame {
    pub fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Same value on both channels
    pub fn mono(value: i16) -> Self {
        Self::new(value, value)
    }

    /// Ring byte layout: left then right, little-endian
    pub fn to_le_bytes(self) -> [u8; 4] {
        let [l0, l1] = self.left.to_le_bytes();
        let [r0, r1] = self.right.to_le_bytes();
        [l0, l1, r0, r1]
    }

    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self {
            left: i16::from_le_bytes([bytes[0], bytes[1]]),
            right: i16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }
}

/// Sound synthesis seam
///
/// Implemented by the simulation. Called once per frame with exactly as many
/// frames as the latency planner asked for; must fill all of them.
pub trait SoundSynthesizer {
    fn synthesize(&mut self, out: &mut [StereoFrame]);
}

/// Outputs digital silence
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl SoundSynthesizer for Silence {
    fn synthesize(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::default());
    }
}

/// Continuous sine tone, phase-continuous across calls and tone changes
#[derive(Debug, Clone)]
pub struct SineWave {
    samples_per_second: u32,
    tone_hz: f32,
    volume: i16,
    t_sine: f32,
}

impl SineWave {
    pub fn new(samples_per_second: u32, tone_hz: f32, volume: i16) -> Self {
        Self {
            samples_per_second,
            tone_hz,
            volume,
            t_sine: 0.0,
        }
    }

    /// Retune without resetting phase
    pub fn set_tone_hz(&mut self, tone_hz: f32) {
        self.tone_hz = tone_hz;
    }
}

impl SoundSynthesizer for SineWave {
    fn synthesize(&mut self, out: &mut [StereoFrame]) {
        let step = TAU * self.tone_hz / self.samples_per_second as f32;
        for frame in out.iter_mut() {
            let value = (self.t_sine.sin() * self.volume as f32) as i16;
            *frame = StereoFrame::mono(value);

            self.t_sine += step;
            // Keep the phase small so f32 precision doesn't degrade over hours
            if self.t_sine >= TAU {
                self.t_sine -= TAU;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_layout_is_little_endian_left_first() {
        let frame = StereoFrame::new(0x0102, -2);
        assert_eq!(frame.to_le_bytes(), [0x02, 0x01, 0xFE, 0xFF]);
        assert_eq!(StereoFrame::from_le_bytes(frame.to_le_bytes()), frame);
    }

    #[test]
    fn test_sine_peak_follows_volume() {
        let mut sine = SineWave::new(48000, 256.0, 3000);
        let mut out = vec![StereoFrame::default(); 48000];
        sine.synthesize(&mut out);

        let peak = out.iter().map(|f| f.left.abs()).max().unwrap();
        assert!((2990..=3000).contains(&peak), "peak {}", peak);
        assert!(out.iter().all(|f| f.left == f.right));
    }

    #[test]
    fn test_sine_phase_continuous_across_calls() {
        let mut whole = SineWave::new(48000, 440.0, 8000);
        let mut split = whole.clone();

        let mut expected = vec![StereoFrame::default(); 200];
        whole.synthesize(&mut expected);

        let mut actual = vec![StereoFrame::default(); 200];
        let (a, b) = actual.split_at_mut(73);
        split.synthesize(a);
        split.synthesize(b);

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_silence() {
        let mut out = vec![StereoFrame::mono(5); 4];
        Silence.synthesize(&mut out);
        assert!(out.iter().all(|f| *f == StereoFrame::default()));
    }
}
