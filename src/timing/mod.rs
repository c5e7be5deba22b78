pub mod clock;
pub mod pacer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use pacer::{FramePacer, FrameTiming, PacerState, PacerStats, sleep_duration};
