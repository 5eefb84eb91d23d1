use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Get suggestions for common errors.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::Config(msg) if msg.contains("PQ2CSV_") => {
                vec!["Check the PQ2CSV_* environment variables hold non-negative integers".into()]
            }
            Error::Config(msg) if msg.contains("flush_every") || msg.contains("batch_size") => {
                vec!["Use a value of at least 1".into()]
            }
            Error::Config(_) => vec![],
        }
    }
}
