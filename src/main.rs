use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use lockstep::audio::{SineWave, SoundSynthesizer, StereoFrame};
use lockstep::config::{FrameRate, PlatformConfig};
use lockstep::input::{Axis, Button, GameInput};
use lockstep::output::{OutputFormat, create_formatter};
use lockstep::platform::{AudioMode, Game, NullEventSource, PlatformContext};
use lockstep::WavRecorder;

#[derive(Parser, Debug)]
#[command(name = "lockstep")]
#[command(about = "Frame-paced sine tone demo driving a hardware-clocked audio ring")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target frame rate (e.g., "30", "60hz", "16.667ms")
    #[arg(short = 'r', long)]
    frame_rate: Option<FrameRate>,

    /// Output sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Base tone frequency in Hz
    #[arg(long, default_value_t = 256.0)]
    tone_hz: f32,

    /// Tone amplitude (0-32767)
    #[arg(long, default_value_t = 3000)]
    volume: i16,

    /// Stop after this many frames (runs until killed otherwise)
    #[arg(short = 'n', long)]
    frames: Option<u64>,

    /// Run without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Record the synthesized stream to a WAV file
    #[arg(long)]
    record: Option<PathBuf>,

    /// Timing report format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print a timing report every N frames (0 disables)
    #[arg(long, default_value_t = 30)]
    report_every: u64,

    /// Include cursor positions in text reports
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Sine tone whose pitch follows the first controller with input
struct ToneGame {
    sine: SineWave,
    base_tone_hz: f32,
}

impl ToneGame {
    fn new(samples_per_second: u32, tone_hz: f32, volume: i16) -> Self {
        Self {
            sine: SineWave::new(samples_per_second, tone_hz, volume),
            base_tone_hz: tone_hz,
        }
    }
}

impl Game for ToneGame {
    fn update_and_render(&mut self, input: &GameInput) {
        let mut offset = 0.0;
        for controller in input.controllers().iter().filter(|c| c.is_connected) {
            if controller.is_analog {
                offset = controller.axis(Axis::StickY);
            } else if controller.button(Button::MoveUp).is_down() {
                offset = 1.0;
            } else if controller.button(Button::MoveDown).is_down() {
                offset = -1.0;
            }
            if offset != 0.0 {
                break;
            }
        }
        self.sine
            .set_tone_hz(self.base_tone_hz + 0.5 * self.base_tone_hz * offset);
    }
}

impl SoundSynthesizer for ToneGame {
    fn synthesize(&mut self, out: &mut [StereoFrame]) {
        self.sine.synthesize(out);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PlatformConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PlatformConfig::default(),
    };
    if let Some(rate) = args.frame_rate {
        config.timing.target_frame_rate = rate;
    }
    if let Some(rate) = args.sample_rate {
        config.audio.samples_per_second = rate;
    }
    config.validate().context("Invalid configuration")?;

    println!("=== lockstep ===");
    println!("Sample rate: {} Hz", config.audio.samples_per_second);
    println!("Target frame rate: {}", config.timing.target_frame_rate);
    println!(
        "Latency: {} samples ({:.1} ms)",
        config.audio.latency_sample_count(),
        config.audio.latency_sample_count() as f32 * 1000.0
            / config.audio.samples_per_second as f32
    );
    println!("Tone: {} Hz", args.tone_hz);
    println!();

    let mode = if args.no_audio {
        AudioMode::Headless
    } else {
        AudioMode::Device
    };
    let sample_rate = config.audio.samples_per_second;
    let mut platform = PlatformContext::new(config, mode)?;
    if mode == AudioMode::Device && !platform.audio_enabled() {
        println!("Audio unavailable, running silent\n");
    }

    let mut recorder = match &args.record {
        Some(path) => Some(
            WavRecorder::create(path, sample_rate)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => None,
    };

    let formatter = create_formatter(args.format, args.verbose);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    let mut game = ToneGame::new(sample_rate, args.tone_hz, args.volume);
    let report_every = args.report_every;

    let frames = platform.run(
        &mut game,
        &mut NullEventSource,
        args.frames,
        |report, produced| {
            if let Some(recorder) = recorder.as_mut() {
                recorder.append(produced)?;
            }
            if report_every > 0 && report.frame_index % report_every == 0 {
                println!("{}", formatter.format(report));
            }
            Ok(())
        },
    )?;

    platform.shutdown();

    if let Some(recorder) = recorder {
        let recorded = recorder.frames();
        recorder.finalize()?;
        println!(
            "\nRecorded {} samples ({:.2}s)",
            recorded,
            recorded as f64 / sample_rate as f64
        );
    }

    if let Some(stats) = platform.pacer_stats() {
        println!("\nFrames: {}", frames);
        println!(
            "Frame time: {:.2}ms mean, {:.2}ms std dev, {:.2}-{:.2}ms",
            stats.mean_ms, stats.std_dev_ms, stats.min_ms, stats.max_ms
        );
        println!("Missed frames: {}", stats.missed);
    }

    Ok(())
}
