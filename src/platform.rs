//! Per-frame platform loop.
//!
//! `PlatformContext` owns every piece of shared state (ring, audio device,
//! input generations, pacer) and is handed by reference to whatever needs
//! it; there are no process-wide singletons.
//!
//! One iteration:
//! 1. the pacer starts its timer
//! 2. the current input generation is seeded from the previous one and
//!    pending events are recorded into it
//! 3. the game updates and renders
//! 4. the latency planner sizes this frame's audio window, the game
//!    synthesizes it and the producer writes it to the ring
//! 5. the pacer waits out the remainder of the frame
//! 6. input generations swap

use std::sync::Arc;

use crate::audio::{
    AudioOutput, FillReport, LatencyPlanner, SampleRing, SoundProducer, SoundSynthesizer,
    StereoFrame,
};
use crate::config::PlatformConfig;
use crate::error::Result;
use crate::input::{GameInput, InputBuffers};
use crate::timing::{Clock, FramePacer, FrameTiming, PacerStats, SystemClock};

/// The simulation driven by the platform loop
pub trait Game: SoundSynthesizer {
    fn update_and_render(&mut self, input: &GameInput);
}

/// Whether the loop should keep running after draining events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Quit,
}

/// Source of input edges, drained once per frame
///
/// Must only consume events already pending; blocking here stalls the frame.
pub trait InputEventSource {
    fn poll(&mut self, input: &mut GameInput) -> EventFlow;
}

/// Event source with no events, for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSource;

impl InputEventSource for NullEventSource {
    fn poll(&mut self, _input: &mut GameInput) -> EventFlow {
        EventFlow::Continue
    }
}

/// How audio leaves the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioMode {
    /// Open the default output device; fall back to `Headless` if it fails
    Device,
    /// No device; the loop drains one frame's worth of audio itself
    Headless,
}

/// Diagnostics for one completed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub timing: FrameTiming,
    pub audio: FillReport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Continue(FrameReport),
    Quit,
}

/// Everything the frame loop owns
pub struct PlatformContext<C: Clock = SystemClock> {
    // Field order is drop order: the device goes before the ring it drains.
    output: Option<AudioOutput>,
    producer: SoundProducer,
    ring: Arc<SampleRing>,
    input: InputBuffers,
    pacer: FramePacer<C>,
    config: PlatformConfig,
    playing: bool,
    headless_drain: Vec<u8>,
    headless_carry: f64,
    frame_index: u64,
}

impl PlatformContext<SystemClock> {
    pub fn new(config: PlatformConfig, mode: AudioMode) -> Result<Self> {
        Self::with_clock(config, mode, SystemClock::new())
    }
}

impl<C: Clock> PlatformContext<C> {
    pub fn with_clock(config: PlatformConfig, mode: AudioMode, clock: C) -> Result<Self> {
        config.validate()?;

        let ring = Arc::new(SampleRing::one_second(
            config.audio.samples_per_second,
            config.audio.bytes_per_sample(),
        ));
        ring.clear();

        let output = match mode {
            AudioMode::Device => match AudioOutput::open(&config.audio, ring.clone()) {
                Ok(output) => Some(output),
                Err(e) => {
                    log::warn!("Audio playback disabled: {}", e);
                    None
                }
            },
            AudioMode::Headless => None,
        };

        let producer = SoundProducer::new(ring.clone(), LatencyPlanner::new(&config.audio));
        let input = InputBuffers::from_config(&config.input);
        let pacer = FramePacer::new(&config.timing, clock);

        log::info!(
            "Platform ready: {} Hz audio, {} frames latency, target {}",
            config.audio.samples_per_second,
            config.audio.latency_sample_count(),
            config.timing.target_frame_rate
        );

        Ok(Self {
            output,
            producer,
            ring,
            input,
            pacer,
            config,
            playing: false,
            headless_drain: Vec::new(),
            headless_carry: 0.0,
            frame_index: 0,
        })
    }

    /// Run one iteration of the frame loop
    pub fn run_frame(
        &mut self,
        game: &mut dyn Game,
        events: &mut dyn InputEventSource,
    ) -> Result<FrameOutcome> {
        self.pacer.begin_frame();

        self.input.begin_frame();
        if events.poll(self.input.current_mut()) == EventFlow::Quit {
            return Ok(FrameOutcome::Quit);
        }

        game.update_and_render(self.input.current());

        let audio = self.producer.fill(game)?;
        self.present_audio();

        let timing = self.pacer.finish_frame();
        self.input.swap();

        let report = FrameReport {
            frame_index: self.frame_index,
            timing,
            audio,
        };
        self.frame_index += 1;
        Ok(FrameOutcome::Continue(report))
    }

    /// Run frames until the event source quits or `max_frames` have run
    ///
    /// `on_frame` sees every report; returns the number of frames run.
    pub fn run(
        &mut self,
        game: &mut dyn Game,
        events: &mut dyn InputEventSource,
        max_frames: Option<u64>,
        mut on_frame: impl FnMut(&FrameReport, &[StereoFrame]) -> Result<()>,
    ) -> Result<u64> {
        let mut frames = 0;
        while max_frames.is_none_or(|max| frames < max) {
            match self.run_frame(game, events)? {
                FrameOutcome::Continue(report) => {
                    on_frame(&report, self.producer.last_frames())?;
                    frames += 1;
                }
                FrameOutcome::Quit => {
                    log::info!("Quit requested after {} frames", frames);
                    break;
                }
            }
        }
        Ok(frames)
    }

    /// Pause the device and release it
    ///
    /// The callback is quiesced before this returns; the ring stays valid for
    /// as long as the context lives. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(output) = self.output.take() {
            if let Err(e) = output.pause() {
                log::warn!("Failed to pause audio on shutdown: {}", e);
            }
            drop(output);
            log::info!("Audio device closed");
        }
        self.playing = false;
    }

    pub fn audio_enabled(&self) -> bool {
        self.output.is_some()
    }

    pub fn ring(&self) -> &Arc<SampleRing> {
        &self.ring
    }

    pub fn input(&self) -> &InputBuffers {
        &self.input
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn pacer_stats(&self) -> Option<PacerStats> {
        self.pacer.stats()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn present_audio(&mut self) {
        let Some(output) = &self.output else {
            self.drain_headless();
            return;
        };

        // Start only after the first fill so the device never plays ahead
        // of primed data.
        if !self.playing {
            match output.resume() {
                Ok(()) => self.playing = true,
                Err(e) => log::warn!("Failed to start audio: {}", e),
            }
        }
        for err in output.drain_errors() {
            log::warn!("Audio stream error: {}", err);
        }
    }

    /// Stand-in for the device callback: consume exactly one frame of audio
    fn drain_headless(&mut self) {
        self.headless_carry += self.config.samples_per_frame();
        let samples = self.headless_carry.floor();
        self.headless_carry -= samples;

        let len = samples as usize * self.config.audio.bytes_per_sample();
        self.headless_drain.resize(len, 0);
        self.ring.consume(&mut self.headless_drain);
    }
}

impl<C: Clock> Drop for PlatformContext<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Silence;
    use crate::timing::ManualClock;
    use std::time::Duration;

    struct Quiet;

    impl SoundSynthesizer for Quiet {
        fn synthesize(&mut self, out: &mut [StereoFrame]) {
            Silence.synthesize(out);
        }
    }

    impl Game for Quiet {
        fn update_and_render(&mut self, _input: &GameInput) {}
    }

    struct QuitAfter(u32);

    impl InputEventSource for QuitAfter {
        fn poll(&mut self, _input: &mut GameInput) -> EventFlow {
            if self.0 == 0 {
                return EventFlow::Quit;
            }
            self.0 -= 1;
            EventFlow::Continue
        }
    }

    #[test]
    fn test_headless_drain_advances_one_frame() {
        let clock = ManualClock::new(Duration::from_micros(50));
        let mut platform =
            PlatformContext::with_clock(PlatformConfig::default(), AudioMode::Headless, &clock)
                .unwrap();

        platform.run_frame(&mut Quiet, &mut NullEventSource).unwrap();

        // 48000 Hz / 30 fps = 1600 frames of 4 bytes
        assert_eq!(platform.ring().cursors().play_cursor, 6400);
        assert!(!platform.audio_enabled());
    }

    #[test]
    fn test_run_stops_on_quit() {
        let clock = ManualClock::new(Duration::from_micros(50));
        let mut platform =
            PlatformContext::with_clock(PlatformConfig::default(), AudioMode::Headless, &clock)
                .unwrap();

        let frames = platform
            .run(&mut Quiet, &mut QuitAfter(3), Some(10), |_, _| Ok(()))
            .unwrap();
        assert_eq!(frames, 3);
        assert_eq!(platform.frame_index(), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PlatformConfig::default();
        config.audio.samples_per_second = 0;
        assert!(PlatformContext::new(config, AudioMode::Headless).is_err());
    }
}
