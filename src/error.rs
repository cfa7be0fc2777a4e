use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the dataset; fatal to the feed.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no header line in {}", path.display())]
    NoHeader { path: PathBuf },
}

/// Failure to process a single row; the row is skipped.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("no column named {column}")]
    MissingColumn { column: &'static str },

    #[error("missing field {column}")]
    MissingField { column: &'static str },

    #[error("invalid {column} value {value:?}")]
    InvalidField { column: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("drawing error: {0}")]
    Draw(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("could not listen on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
