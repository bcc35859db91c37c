use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("class not found: {class_name} in {coordinate}")]
    ClassNotFound {
        class_name: String,
        coordinate: String,
    },
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
    #[error("archive unreadable: {0}")]
    ArchiveUnreadable(String),
    #[error("malformed class file: {0}")]
    MalformedClass(String),
    #[error("decompiler unavailable: {0}")]
    DecompilerUnavailable(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("index is busy: {0}")]
    StoreBusy(String),
    #[error("full-text index error: {0}")]
    Index(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("internal error: {0}")]
    Internal(String),
    /// A catastrophic failure in Scanner or Store (panic, snapshot
    /// corruption) that aborts the current indexing run rather than being
    /// swallowed per-artifact (base spec §4.5/§7/§9).
    #[error("fatal indexing error: {0}")]
    Fatal(String),
}

impl From<jarscope_java::JavaReaderError> for CoreError {
    fn from(err: jarscope_java::JavaReaderError) -> Self {
        match err {
            jarscope_java::JavaReaderError::MalformedClass(msg) => CoreError::MalformedClass(msg),
            jarscope_java::JavaReaderError::ArchiveUnreadable(msg) => {
                CoreError::ArchiveUnreadable(msg)
            }
            jarscope_java::JavaReaderError::Io(e) => CoreError::Io(e),
        }
    }
}

impl From<jarscope_api::DetailError> for CoreError {
    fn from(err: jarscope_api::DetailError) -> Self {
        match err {
            jarscope_api::DetailError::ClassNotFound {
                class_name,
                coordinate,
            } => CoreError::ClassNotFound {
                class_name,
                coordinate,
            },
            jarscope_api::DetailError::ArchiveUnreadable(msg) => CoreError::ArchiveUnreadable(msg),
            jarscope_api::DetailError::DecompilerUnavailable(msg) => {
                CoreError::DecompilerUnavailable(msg)
            }
            jarscope_api::DetailError::Io(e) => CoreError::Io(e),
        }
    }
}

impl From<jarscope_api::QueryError> for CoreError {
    fn from(err: jarscope_api::QueryError) -> Self {
        match err {
            jarscope_api::QueryError::InvalidQuery(msg) => CoreError::InvalidQuery(msg),
        }
    }
}

impl From<jarscope_ingest::IngestError> for CoreError {
    fn from(err: jarscope_ingest::IngestError) -> Self {
        CoreError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
