use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;

use super::ring::SampleRing;
use crate::config::AudioConfig;
use crate::constants::{BYTES_PER_SAMPLE, CHANNELS};
use crate::error::{LockstepError, Result};

/// Output device fed from the sample ring
///
/// The stream is created paused; call `resume` once the ring has been
/// primed. Dropping the output pauses the stream and then releases it, so
/// the callback is quiesced before the last reference to the ring it drains
/// can go away.
pub struct AudioOutput {
    stream: cpal::Stream,
    errors: Receiver<String>,
}

impl AudioOutput {
    /// Open the default output device as interleaved stereo i16
    ///
    /// Fails with `AudioDevice` when no device is available and with
    /// `FormatMismatch` when the device cannot play the requested format.
    pub fn open(config: &AudioConfig, ring: Arc<SampleRing>) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| LockstepError::AudioDevice("No output device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Output device: {:?}", desc),
            Err(_) => log::info!("Output device: Unknown"),
        }

        check_format(&device, config)?;

        let stream_config = cpal::StreamConfig {
            channels: CHANNELS,
            sample_rate: config.samples_per_second,
            buffer_size: cpal::BufferSize::Fixed(config.device_buffer_frames),
        };

        let (error_tx, error_rx) = crossbeam_channel::bounded(16);
        let callback_errors = error_tx.clone();
        let device_buffer_frames = config.device_buffer_frames;
        let sample_rate = config.samples_per_second;
        let mut scratch = vec![0u8; callback_scratch_len(config)];
        let mut promoted = false;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    if !promoted {
                        promoted = true;
                        // Never demoted; the thread belongs to the backend
                        if let Err(e) = audio_thread_priority::promote_current_thread_to_real_time(
                            device_buffer_frames,
                            sample_rate,
                        ) {
                            let _ = callback_errors
                                .try_send(format!("could not set real-time priority: {}", e));
                        }
                    }
                    fill_from_ring(&ring, data, &mut scratch);
                },
                move |err| {
                    // Reported on the next frame; a full queue drops the newest
                    let _ = error_tx.try_send(err.to_string());
                },
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::StreamConfigNotSupported => LockstepError::FormatMismatch {
                    requested: requested_format(config),
                    offered: "a different stream configuration".into(),
                },
                other => LockstepError::AudioStream(format!("{}", other)),
            })?;

        stream
            .pause()
            .map_err(|e| LockstepError::AudioStream(format!("{}", e)))?;

        Ok(Self {
            stream,
            errors: error_rx,
        })
    }

    /// Start (or restart) pulling samples from the ring
    pub fn resume(&self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| LockstepError::AudioStream(format!("{}", e)))
    }

    /// Stop the callback without releasing the device
    pub fn pause(&self) -> Result<()> {
        self.stream
            .pause()
            .map_err(|e| LockstepError::AudioStream(format!("{}", e)))
    }

    /// Stream errors reported by the backend since the last call
    pub fn drain_errors(&self) -> Vec<String> {
        self.errors.try_iter().collect()
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}

/// Body of the output callback: drain `data.len()` samples from the ring
///
/// Only allocates when `scratch` is shorter than the request. Assumes the backend consumes everything it asks for; the cursors advance
/// by the full request.
pub fn fill_from_ring(ring: &SampleRing, data: &mut [i16], scratch: &mut Vec<u8>) {
    let len = data.len() * 2;
    if scratch.len() < len {
        scratch.resize(len, 0);
    }
    let bytes = &mut scratch[..len];
    ring.consume(bytes);

    for (sample, pair) in data.iter_mut().zip(bytes.chunks_exact(2)) {
        *sample = i16::from_le_bytes([pair[0], pair[1]]);
    }
}

/// Scratch bytes preallocated for the callback
///
/// One second of audio, so no realistic request makes the callback allocate.
pub fn callback_scratch_len(config: &AudioConfig) -> usize {
    config
        .secondary_buffer_size()
        .max(config.device_buffer_frames as usize * BYTES_PER_SAMPLE * 2)
}

fn requested_format(config: &AudioConfig) -> String {
    format!("I16 {}ch {}Hz", CHANNELS, config.samples_per_second)
}

fn check_format(device: &cpal::Device, config: &AudioConfig) -> Result<()> {
    let rate = config.samples_per_second;
    let supported = device
        .supported_output_configs()
        .map_err(|e| LockstepError::AudioDevice(format!("{}", e)))?
        .any(|range| {
            range.channels() == CHANNELS
                && range.sample_format() == cpal::SampleFormat::I16
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        });

    if supported {
        return Ok(());
    }

    let offered = match device.default_output_config() {
        Ok(default) => format!(
            "{:?} {}ch {:?}Hz",
            default.sample_format(),
            default.channels(),
            default.sample_rate()
        ),
        Err(_) => "no usable configuration".to_string(),
    };

    Err(LockstepError::FormatMismatch {
        requested: requested_format(config),
        offered,
    })
}
