use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("other error: {0}")]
    Other(String),
}

impl Error {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        let ctx = context.into();
        match self {
            Error::Schema(msg) => Error::Schema(format!("{}: {}", ctx, msg)),
            Error::Other(msg) => Error::Other(format!("{}: {}", ctx, msg)),
            other => Error::Other(format!("{}: {}", ctx, other)),
        }
    }
}

