use crate::error::Result;
use std::path::Path;
use tokio::fs;
use tracing::debug;

pub mod archives;
pub mod files;
pub mod paths;
pub mod temps;

pub async fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path).await?;
        debug!("created directory: {:?}", path);
    }

    Ok(())
}
