use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid parameter {name}: {value} (must be finite and positive)")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Invalid sample period: {0} (must be finite and positive)")]
    InvalidSamplePeriod(f64),

    #[error("Invalid duration for setpoint {index}: {value}")]
    NegativeDuration { index: usize, value: f64 },

    #[error("Length mismatch: {setpoints} setpoints but {durations} durations")]
    LengthMismatch { setpoints: usize, durations: usize },

    #[error("Reference has no setpoints")]
    EmptyReference,

    #[error("Reference too long: {count} samples (limit {limit})")]
    ReferenceTooLong { count: f64, limit: usize },

    #[error("Unbound symbol: {0}")]
    UnboundSymbol(String),

    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Index out of range: {what} (index={index}, len={len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn plot<E: std::fmt::Display>(e: E) -> Self {
        Error::Plot(e.to_string())
    }
}
