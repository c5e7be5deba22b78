#![allow(dead_code)]

use lockstep::audio::{SoundSynthesizer, StereoFrame};
use lockstep::input::{Button, ControllerSlot, GameInput};
use lockstep::platform::{EventFlow, Game, InputEventSource};

/// Deterministic byte pattern that never repeats within 251 bytes
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| ((i % 251) as u8).wrapping_mul(7).wrapping_add(seed))
        .collect()
}

/// Synthesizer emitting consecutive sample numbers, so gaps and repeats are visible
pub struct RampSynth {
    pub next: i16,
    pub calls: Vec<usize>,
}

impl RampSynth {
    pub fn new() -> Self {
        Self {
            next: 0,
            calls: Vec::new(),
        }
    }
}

impl SoundSynthesizer for RampSynth {
    fn synthesize(&mut self, out: &mut [StereoFrame]) {
        self.calls.push(out.len());
        for frame in out {
            *frame = StereoFrame::new(self.next, self.next.wrapping_neg());
            self.next = self.next.wrapping_add(1);
        }
    }
}

/// Game that remembers what input it saw each frame
pub struct RecordingGame {
    pub synth: RampSynth,
    pub seen: Vec<GameInput>,
}

impl RecordingGame {
    pub fn new() -> Self {
        Self {
            synth: RampSynth::new(),
            seen: Vec::new(),
        }
    }
}

impl SoundSynthesizer for RecordingGame {
    fn synthesize(&mut self, out: &mut [StereoFrame]) {
        self.synth.synthesize(out);
    }
}

impl Game for RecordingGame {
    fn update_and_render(&mut self, input: &GameInput) {
        self.seen.push(input.clone());
    }
}

/// Replays a fixed list of key events per frame, then quits
pub struct ScriptedEvents {
    frames: Vec<Vec<(ControllerSlot, Button, bool)>>,
    frame: usize,
}

impl ScriptedEvents {
    pub fn new(frames: Vec<Vec<(ControllerSlot, Button, bool)>>) -> Self {
        Self { frames, frame: 0 }
    }
}

impl InputEventSource for ScriptedEvents {
    fn poll(&mut self, input: &mut GameInput) -> EventFlow {
        let Some(events) = self.frames.get(self.frame) else {
            return EventFlow::Quit;
        };
        for &(slot, button, is_down) in events {
            input.process_key(slot, button, is_down);
        }
        self.frame += 1;
        EventFlow::Continue
    }
}
