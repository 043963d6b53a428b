//! Reads the manifest from disk.

use super::Manifest;
use crate::error::{Error, Result};
use log::debug;
use std::path::Path;

/// File name looked up in the current directory when no path is given.
pub const DEFAULT_MANIFEST: &str = "Gemfile";

/// Read the whole manifest at `path`.
///
/// A directory is searched for a `Gemfile` inside it. A missing file yields
/// [`Error::ManifestNotFound`]; other I/O failures are returned as
/// [`Error::Io`].
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let path = if path.is_dir() {
        path.join(DEFAULT_MANIFEST)
    } else {
        path.to_path_buf()
    };

    debug!("Reading manifest {}", path.display());

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ManifestNotFound(path));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    debug!("Read {} bytes from {}", content.len(), path.display());

    Ok(Manifest {
        path: Some(path),
        content,
    })
}
