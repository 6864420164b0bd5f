//! File write helper.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use crate::error::FileError;

/// Overwrite an existing file with `data`.
///
/// The path is resolved against the current directory. The file must already
/// exist and be writable. Returns the absolute path written.
pub fn write_to_file(path: impl AsRef<Path>, data: &str) -> Result<PathBuf, FileError> {
    let path = path.as_ref();
    let abs_path = std::path::absolute(path).map_err(|source| FileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let shown_path = abs_path.display().to_string();

    let metadata = match std::fs::metadata(&abs_path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(FileError::NotFound(shown_path)),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(FileError::PermissionDenied(shown_path))
        }
        Err(source) => return Err(FileError::Io { path: shown_path, source }),
    };
    if metadata.is_dir() || metadata.permissions().readonly() {
        return Err(FileError::PermissionDenied(shown_path));
    }

    std::fs::write(&abs_path, data).map_err(|source| match source.kind() {
        ErrorKind::PermissionDenied => FileError::PermissionDenied(shown_path.clone()),
        _ => FileError::Io { path: shown_path.clone(), source },
    })?;

    tracing::info!("Wrote {} bytes to {}", data.len(), shown_path);
    Ok(abs_path)
}
