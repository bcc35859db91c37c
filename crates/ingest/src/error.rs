use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("worker pool join failure: {0}")]
    Join(String),
    #[error("item processing failed: {0}")]
    Item(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
