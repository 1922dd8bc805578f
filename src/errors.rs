use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("document store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("cannot cast field '{field}' from {value}")]
    SchemaCast { field: &'static str, value: String },

    #[error("feature vector decode failed: {0}")]
    VectorDecode(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] deltalake::arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] deltalake::parquet::errors::ParquetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("run catalog error: {0}")]
    Catalog(#[from] rusqlite::Error),

    #[error("previous-day recovery failed: {0}")]
    Recovery(String),

    #[error("telemetry emission failed: {0}")]
    Telemetry(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FeedError>;
