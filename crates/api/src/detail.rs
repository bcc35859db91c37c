use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which facet of a class `DetailExtractor::extract` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    Signatures,
    Docs,
    Source,
}

/// Result of a per-class detail extraction (base spec §4.7).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDetail {
    pub signatures: Vec<String>,
    pub doc: Option<String>,
    pub source: Option<String>,
    pub language: Option<String>,
    /// Set when the source text was reconstructed by the decompiler
    /// fallback rather than read from a `-sources.jar`.
    pub used_decompilation: bool,
}

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("class {class_name} not found in artifact {coordinate}")]
    ClassNotFound {
        class_name: String,
        coordinate: String,
    },
    #[error("archive unreadable: {0}")]
    ArchiveUnreadable(String),
    #[error("decompiler unavailable: {0}")]
    DecompilerUnavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
