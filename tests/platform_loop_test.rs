mod common;

use std::time::Duration;

use lockstep::audio::StereoFrame;
use lockstep::config::PlatformConfig;
use lockstep::input::{Axis, Button, ControllerSlot, GameInput};
use lockstep::platform::{
    AudioMode, EventFlow, FrameOutcome, InputEventSource, NullEventSource, PlatformContext,
};
use lockstep::timing::ManualClock;

use common::{RecordingGame, ScriptedEvents};

fn headless(clock: &ManualClock) -> PlatformContext<&ManualClock> {
    PlatformContext::with_clock(PlatformConfig::default(), AudioMode::Headless, clock).unwrap()
}

#[test]
fn test_first_frame_primes_latency_window() {
    let clock = ManualClock::new(Duration::from_micros(25));
    let mut platform = headless(&clock);
    let mut game = RecordingGame::new();

    let FrameOutcome::Continue(report) = platform
        .run_frame(&mut game, &mut NullEventSource)
        .unwrap()
    else {
        panic!("first frame quit");
    };

    assert_eq!(report.frame_index, 0);
    assert_eq!(report.audio.samples_written, 3200);
    assert_eq!(game.synth.calls, vec![3200]);
}

#[test]
fn test_steady_state_refills_one_frame_per_frame() {
    let clock = ManualClock::new(Duration::from_micros(25));
    let mut platform = headless(&clock);
    let mut game = RecordingGame::new();

    let mut produced: Vec<StereoFrame> = Vec::new();
    let frames = platform
        .run(&mut game, &mut NullEventSource, Some(40), |report, frames| {
            assert!(!report.timing.missed);
            produced.extend_from_slice(frames);
            Ok(())
        })
        .unwrap();

    assert_eq!(frames, 40);
    assert!(game.synth.calls[1..].iter().all(|&n| n == 1600));

    // The ramp shows every sample was produced exactly once, in order
    for (i, frame) in produced.iter().enumerate() {
        assert_eq!(frame.left, i as i16);
    }
}

#[test]
fn test_ring_holds_consecutive_samples_ahead_of_play_cursor() {
    let clock = ManualClock::new(Duration::from_micros(25));
    let mut platform = headless(&clock);
    let mut game = RecordingGame::new();

    platform
        .run(&mut game, &mut NullEventSource, Some(10), |_, _| Ok(()))
        .unwrap();

    // 3200 + 9 * 1600 samples written, 10 * 1600 played: the last 1600
    // are still buffered and continue the ramp.
    let mut bytes = vec![0u8; 1600 * 4];
    platform.ring().consume(&mut bytes);
    for (i, chunk) in bytes.chunks_exact(4).enumerate() {
        let frame = StereoFrame::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        assert_eq!(frame.left, (16_000 + i) as i16);
    }
}

#[test]
fn test_input_reaches_game_with_seeded_state() {
    let clock = ManualClock::new(Duration::from_micros(25));
    let mut platform = headless(&clock);
    let mut game = RecordingGame::new();
    let kb = ControllerSlot::Keyboard;

    let mut events = ScriptedEvents::new(vec![
        vec![(kb, Button::ActionUp, true)],
        vec![(kb, Button::ActionUp, true)], // auto-repeat
        vec![],
        vec![(kb, Button::ActionUp, false), (kb, Button::ActionUp, true)],
    ]);

    let frames = platform
        .run(&mut game, &mut events, None, |_, _| Ok(()))
        .unwrap();
    assert_eq!(frames, 4);

    let states: Vec<_> = game
        .seen
        .iter()
        .map(|input| input.keyboard().button(Button::ActionUp))
        .collect();

    assert!(states[0].ended_down && states[0].half_transition_count == 1);
    assert!(states[1].ended_down && states[1].half_transition_count == 0);
    assert!(states[2].ended_down && states[2].half_transition_count == 0);
    assert!(states[3].ended_down && states[3].half_transition_count == 2);
    assert!(states[3].was_pressed());
}

#[test]
fn test_stats_and_shutdown() {
    let clock = ManualClock::new(Duration::from_micros(25));
    let mut platform = headless(&clock);
    let mut game = RecordingGame::new();

    platform
        .run(&mut game, &mut NullEventSource, Some(5), |_, _| Ok(()))
        .unwrap();

    let stats = platform.pacer_stats().unwrap();
    assert_eq!(stats.frames, 5);
    assert!((stats.mean_ms - 1000.0 / 30.0).abs() < 0.5);

    platform.shutdown();
    platform.shutdown();
    assert!(!platform.audio_enabled());
}

/// Feeds one raw stick reading per frame, then quits
struct RawStick(Vec<i16>);

impl InputEventSource for RawStick {
    fn poll(&mut self, input: &mut GameInput) -> EventFlow {
        if self.0.is_empty() {
            return EventFlow::Quit;
        }
        let raw = self.0.remove(0);
        input.set_stick_raw(ControllerSlot::Gamepad(0), Axis::StickX, raw);
        EventFlow::Continue
    }
}

#[test]
fn test_raw_stick_uses_configured_deadzone() {
    let clock = ManualClock::new(Duration::from_micros(25));
    let mut config = PlatformConfig::default();
    config.input.stick_deadzone = 10_000;
    let mut platform =
        PlatformContext::with_clock(config, AudioMode::Headless, &clock).unwrap();
    let mut game = RecordingGame::new();

    let frames = platform
        .run(&mut game, &mut RawStick(vec![9_000, 32_767, -32_768]), None, |_, _| Ok(()))
        .unwrap();
    assert_eq!(frames, 3);

    let pad = ControllerSlot::Gamepad(0);
    let x: Vec<f32> = game
        .seen
        .iter()
        .map(|input| input.controller(pad).unwrap().axis(Axis::StickX))
        .collect();
    assert_eq!(x, vec![0.0, 1.0, -1.0]);
    assert!(game.seen[0].controller(pad).unwrap().is_analog);
}
