pub mod output;
pub mod planner;
pub mod producer;
pub mod ring;
pub mod synth;

pub use output::AudioOutput;
pub use planner::{LatencyPlanner, SoundOutputPlan};
pub use producer::{FillReport, SoundProducer};
pub use ring::{CursorSnapshot, SampleRing};
pub use synth::{SineWave, Silence, SoundSynthesizer, StereoFrame};
