use std::io;
use std::path::PathBuf;

/// Failure to pull one record out of the backing file.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line number {line} is too small, lines start at 1")]
    LineNumberTooSmall { line: usize },

    #[error("file does not have line {line}")]
    NoSuchLine { line: usize },

    #[error("line {line} has no numeric prefix")]
    NotNumeric { line: usize },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LineError {
    /// Missing and malformed records are reported and skipped; I/O failures
    /// are fatal for the measurement that hit them.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LineError::Io { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MountainError {
    #[error("working set of {requested} elements exceeds buffer capacity of {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("stride must be at least 1 element")]
    ZeroStride,

    #[error("invalid sweep configuration: {0}")]
    InvalidConfig(String),

    #[error("clock calibration failed: {0}")]
    Calibration(String),

    #[error(transparent)]
    Line(#[from] LineError),

    #[error("failed to write measurement: {0}")]
    Output(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MountainError>;
