use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`crate::pdf::DocumentEngine`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to parse PDF: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("PDF is encrypted")]
    Encrypted,

    #[error("page index {index} is out of range (document has {total} pages)")]
    PageOutOfRange { index: u32, total: u32 },

    #[error("malformed document: {reason}")]
    Malformed { reason: String },

    #[error("failed to serialize PDF: {reason}")]
    Serialize { reason: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{name} is not a PDF file")]
    NotPdf { name: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load PDF: {0}")]
    Engine(#[from] EngineError),

    #[error("PDF has no pages")]
    NoPages,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to extract range {range}: {source}")]
    Extraction {
        range: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to merge {file_name}: {source}")]
    Merge {
        file_name: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to deliver {file_name}: {source}")]
    Delivery {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no document loaded")]
    NotLoaded,

    #[error("nothing to merge: split the document first")]
    NothingToMerge,

    #[error("a run is already in progress")]
    Busy,
}
