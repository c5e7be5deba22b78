use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::audio::StereoFrame;
use crate::constants::CHANNELS;
use crate::error::Result;

/// Records every frame the producer synthesizes to a 16-bit stereo WAV file
pub struct WavRecorder {
    writer: WavWriter<BufWriter<File>>,
    frames: u64,
}

impl WavRecorder {
    pub fn create<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: CHANNELS,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)?;
        Ok(Self { writer, frames: 0 })
    }

    pub fn append(&mut self, frames: &[StereoFrame]) -> Result<()> {
        for frame in frames {
            self.writer.write_sample(frame.left)?;
            self.writer.write_sample(frame.right)?;
        }
        self.frames += frames.len() as u64;
        Ok(())
    }

    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Flush and write the final header sizes
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}
