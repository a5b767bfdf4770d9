use thiserror::Error;

/// Problems detected while building a pipeline configuration.
///
/// These are always raised before streaming starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid threshold band: min={min:?}, mid={mid:?}, max={max}")]
    InvalidThresholds {
        min: Option<u8>,
        mid: Option<u8>,
        max: u8,
    },

    #[error("Invalid frame rate: {0} (must be positive)")]
    InvalidFrameRate(i64),

    #[error("Unknown classifier: {0}")]
    UnknownClassifier(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Unknown HSV mode: {0}")]
    UnknownHsvMode(String),

    #[error("Unknown output format: {0}")]
    UnknownOutputFormat(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid worker count: {0}")]
    InvalidWorkerCount(String),
}

#[derive(Error, Debug)]
pub enum ChromaKeyError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Frame source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Frame sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Pipeline is {0}")]
    InvalidState(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChromaKeyError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, ChromaKeyError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, ChromaKeyError>;
