use thiserror::Error;

#[derive(Debug, Error)]
pub enum JavaReaderError {
    #[error("malformed class file: {0}")]
    MalformedClass(String),
    #[error("archive unreadable: {0}")]
    ArchiveUnreadable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JavaReaderError>;
