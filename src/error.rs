use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockstepError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Sample format mismatch: requested {requested}, device offers {offered}")]
    FormatMismatch { requested: String, offered: String },

    #[error("Ring write of {len} bytes exceeds capacity of {capacity} bytes")]
    BufferOverflow { len: usize, capacity: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file: {0}")]
    ConfigFile(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("WAV capture failed: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, LockstepError>;
