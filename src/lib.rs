pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod input;
pub mod output;
pub mod platform;
pub mod timing;
pub mod wav;

pub use config::PlatformConfig;
pub use error::{LockstepError, Result};
pub use platform::{AudioMode, Game, PlatformContext};
pub use wav::WavRecorder;
