use std::io;

/// Failure to turn a sensor line into a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Grid line must have 64 cells. Actually {0} cells.")]
    WrongCellCount(usize),
}

/// Rejected scan request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("Sample count must be a positive integer. Observed = {0:?}.")]
    InvalidSampleCount(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error(transparent)]
    Serial(#[from] serialport::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Failed to parse the configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Failed to write the configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("The rig thread is not running")]
    RigStopped,
}
