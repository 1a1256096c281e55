use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::model::StructuredDocument;

/// A document that cannot be read or decoded fails as a whole; there is
/// no partial extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read document {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document {path} is not a valid structured document")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads the paragraph interchange produced by an upstream converter.
/// Container formats (docx and friends) are that converter's concern,
/// not ours.
pub fn load_document(path: &Path) -> Result<StructuredDocument, ExtractionError> {
    let raw = fs::read(path).map_err(|source| ExtractionError::Read {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_slice(&raw).map_err(|source| ExtractionError::Parse {
        path: path.display().to_string(),
        source,
    })
}
