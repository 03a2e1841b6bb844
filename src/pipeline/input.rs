//! Input handling: the raw file blobs a batch is built from.
//!
//! A [`RawImageInput`] is what a file picker hands over: a name, a declared
//! MIME type, and the untouched bytes. The codec gateway consumes it once.
//! [`load_path`] builds one from disk, inferring the MIME type from the
//! extension the way browsers fill `File.type`.

use crate::error::Images2DocxError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// One user-selected image file.
#[derive(Debug, Clone)]
pub struct RawImageInput {
    /// File name as shown to the user (no directory part).
    pub name: String,
    /// Declared MIME type; empty when unknown.
    pub mime: String,
    /// Immutable file contents.
    pub bytes: Arc<[u8]>,
}

impl RawImageInput {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Build an input whose MIME type is inferred from `name`'s extension.
    pub fn from_named_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let mime = mime_from_name(&name).unwrap_or_default().to_string();
        Self::new(name, mime, bytes)
    }
}

/// MIME type for well-known raster image extensions (case-insensitive).
pub fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => return None,
    };
    Some(mime)
}

/// Read a local image file into a [`RawImageInput`].
pub async fn load_path(path: impl AsRef<Path>) -> Result<RawImageInput, Images2DocxError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Images2DocxError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Images2DocxError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Images2DocxError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let name = display_name(path);
    debug!("Loaded {} ({} bytes)", name, bytes.len());
    Ok(RawImageInput::from_named_bytes(name, bytes))
}

/// Read several files, preserving order. Stops at the first unreadable path.
pub async fn load_paths<P: AsRef<Path>>(
    paths: &[P],
) -> Result<Vec<RawImageInput>, Images2DocxError> {
    let mut inputs = Vec::with_capacity(paths.len());
    for p in paths {
        inputs.push(load_path(p).await?);
    }
    Ok(inputs)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}
