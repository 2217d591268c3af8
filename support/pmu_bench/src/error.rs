use pmu_clock::PmuError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Pmu(#[from] PmuError),

    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration '{path}': {message}")]
    ConfigParse { path: String, message: String },

    #[error("Failed to write report: {0}")]
    Report(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for BenchError {
    fn from(e: serde_json::Error) -> Self {
        BenchError::Report(e.to_string())
    }
}

pub type BenchResult<T> = Result<T, BenchError>;
