//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME type of the produced container.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The finished document, ready to hand to a save/download collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentArtifact {
    /// Suggested file name, e.g. `images.docx`.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentArtifact {
    pub fn mime_type(&self) -> &'static str {
        DOCX_MIME_TYPE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for DocumentArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentArtifact")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Numbers describing one finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Images placed in the grid.
    pub images: usize,
    /// Table rows produced.
    pub rows: usize,
    /// Columns per row.
    pub columns: usize,
    /// Files the HEIF decoder handed back to the native path.
    pub fallbacks: usize,
    /// Sum of the raw input sizes.
    pub input_bytes: u64,
    /// Sum of the recompressed JPEG sizes.
    pub encoded_bytes: u64,
    /// Size of the final document.
    pub document_bytes: u64,
    pub normalize_duration_ms: u64,
    pub assemble_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything [`crate::convert::convert`] returns.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub document: DocumentArtifact,
    pub stats: ConversionStats,
}
