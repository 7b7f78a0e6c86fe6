use std::path::PathBuf;

use thiserror::Error;

/// Only I/O-level faults surface here; bad quote content never fails a render.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create output directory `{path}`: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write document `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode image data: {0}")]
    Encode(#[from] std::io::Error),
}
