use crate::error::{RecipeError, Result};
use crate::store::{self, paths, temps};
use sha256::try_digest;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

/// Where a distribution comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Http(Url),
    Local(PathBuf),
}

/// Resolves a configured url to a concrete source. Bare paths are local.
pub fn resolve_source(url: &str) -> Result<SourceKind> {
    match Url::parse(url) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => Ok(SourceKind::Http(parsed)),
            "file" => parsed
                .to_file_path()
                .map(SourceKind::Local)
                .map_err(|_| RecipeError::UnsupportedUrl(url.to_string())),
            _ => Err(RecipeError::UnsupportedUrl(url.to_string())),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(SourceKind::Local(PathBuf::from(url))),
        Err(err) => Err(RecipeError::UnsupportedUrl(format!("{url}: {err}"))),
    }
}

/// Returns the cached archive for `url`, downloading it into `downloads_dir`
/// first when it is not there yet. A cache hit never touches the network.
/// Only archives matching `sha256` are ever left in the cache.
pub async fn fetch(url: &str, downloads_dir: &Path, sha256: Option<&str>) -> Result<PathBuf> {
    store::ensure_dir(downloads_dir).await?;

    let archive_path = paths::get_archive_path(downloads_dir, url)?;

    if archive_path.is_file() {
        info!("distribution already downloaded: {:?}", archive_path);

        if let Some(expected) = sha256 {
            if let Err(err) = verify(&archive_path, expected) {
                warn!("removing cached distribution: {:?}", archive_path);
                tokio::fs::remove_file(&archive_path).await?;
                return Err(err);
            }
        }
    } else {
        let partial = temps::create_temp_file(downloads_dir)?;

        match resolve_source(url)? {
            SourceKind::Http(url) => {
                info!("downloading distribution: {}", url);
                download(&url, partial.path()).await?;
            }
            SourceKind::Local(path) => {
                info!("copying distribution: {:?}", path);
                tokio::fs::copy(&path, partial.path()).await?;
            }
        }

        if let Some(expected) = sha256 {
            verify(partial.path(), expected)?;
        }

        partial
            .persist(&archive_path)
            .map_err(|err| RecipeError::Io(err.error))?;

        debug!("cached distribution: {:?}", archive_path);
    }

    Ok(archive_path)
}

async fn download(url: &Url, target: &Path) -> Result<()> {
    let download_error = |source| RecipeError::Download {
        url: url.to_string(),
        source,
    };

    let mut response = reqwest::get(url.as_str())
        .await
        .and_then(|response| response.error_for_status())
        .map_err(download_error)?;

    let mut file = File::create(target).await?;

    while let Some(chunk) = response.chunk().await.map_err(download_error)? {
        file.write_all(&chunk).await?;
    }

    file.flush().await?;

    Ok(())
}

fn verify(path: &Path, expected: &str) -> Result<()> {
    let actual = try_digest(path)?;

    if actual != expected {
        return Err(RecipeError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }

    debug!("checksum verified: {:?}", path);

    Ok(())
}
