use crate::error::Result;
use std::path::Path;
use tempfile::{Builder, NamedTempFile, TempDir};

/// Fresh extraction directory for a part. Removed when the guard drops, on
/// success and on every error path.
pub fn create_temp_dir(part_name: &str) -> Result<TempDir> {
    let dir = Builder::new()
        .prefix(&format!("buildout-{part_name}-"))
        .tempdir()?;

    Ok(dir)
}

/// Partial download sitting next to its final location so the rename into
/// place stays on one filesystem.
pub fn create_temp_file(dir: &Path) -> Result<NamedTempFile> {
    let file = Builder::new().prefix(".download-").tempfile_in(dir)?;

    Ok(file)
}
