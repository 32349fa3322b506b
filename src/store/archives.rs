use crate::error::{RecipeError, Result};
use crate::store::{files, temps};
use async_compression::tokio::bufread::GzipDecoder;
use async_zip::tokio::read::seek::ZipFileReader;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs::{copy, create_dir_all, set_permissions, File, OpenOptions};
use tokio::io::BufReader;
use tokio_tar::ArchiveBuilder;
use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

/// Archive format, picked from the file name alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
    Plain,
}

impl ArchiveKind {
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
            Self::TarGz
        } else if file_name.ends_with(".zip") {
            Self::Zip
        } else {
            Self::Plain
        }
    }
}

/// An extracted source tree. `root` lives inside `temp_dir`, which is removed
/// when this value drops.
#[derive(Debug)]
pub struct Extracted {
    pub root: PathBuf,
    pub temp_dir: TempDir,
}

/// Extracts `archive_path` into a fresh temp dir and strips the single
/// top-level directory archives usually wrap their contents in. Plain files
/// are copied as-is and the temp dir itself becomes the root.
pub async fn extract(part_name: &str, archive_path: &Path, file_name: &str) -> Result<Extracted> {
    let temp_dir = temps::create_temp_dir(part_name)?;
    let temp_path = temp_dir.path().to_path_buf();
    let kind = ArchiveKind::from_file_name(file_name);

    info!("extracting {:?} ({:?}) into {:?}", file_name, kind, temp_path);

    let unpacked = match kind {
        ArchiveKind::TarGz => unpack_gzip(&temp_path, archive_path).await,
        ArchiveKind::Zip => unpack_zip(archive_path, &temp_path).await,
        ArchiveKind::Plain => copy(archive_path, temp_path.join(file_name))
            .await
            .map(|_| ())
            .map_err(RecipeError::from),
    };

    if let Err(err) = unpacked {
        return Err(RecipeError::Extraction {
            archive: file_name.to_string(),
            temp_dir: temp_path,
            reason: err.to_string(),
        });
    }

    if kind == ArchiveKind::Plain {
        return Ok(Extracted {
            root: temp_path,
            temp_dir,
        });
    }

    let top_level = files::list_dir(&temp_path).await?;

    if top_level.len() != 1 {
        return Err(RecipeError::AmbiguousLayout {
            archive: file_name.to_string(),
            entries: top_level.len(),
        });
    }

    let root = temp_path.join(&top_level[0]);

    debug!("stripped top level directory: {:?}", root);

    Ok(Extracted { root, temp_dir })
}

pub async fn unpack_gzip(target_dir: &Path, source_tar: &Path) -> Result<()> {
    let tar_gz = File::open(source_tar).await?;

    let buf_reader = BufReader::new(tar_gz);

    let gz_decoder = GzipDecoder::new(buf_reader);

    let mut archive = ArchiveBuilder::new(gz_decoder)
        .set_preserve_permissions(true)
        .build();

    archive.unpack(target_dir).await?;

    Ok(())
}

/// Returns a relative path without reserved names, redundant separators, ".", or "..".
fn sanitize_file_path(path: &str) -> PathBuf {
    path.replace('\\', "/")
        .split('/')
        .map(sanitize_filename::sanitize)
        .filter(|component| !component.is_empty())
        .collect()
}

fn zip_error(err: async_zip::error::ZipError) -> RecipeError {
    RecipeError::Io(std::io::Error::other(err))
}

pub async fn unpack_zip(source_path: &Path, out_dir: &Path) -> Result<()> {
    let archive_file = File::open(source_path).await?;

    let archive = BufReader::new(archive_file).compat();

    let mut reader = ZipFileReader::new(archive).await.map_err(zip_error)?;

    for index in 0..reader.file().entries().len() {
        let Some(entry) = reader.file().entries().get(index) else {
            continue;
        };

        let path = out_dir.join(sanitize_file_path(
            entry.filename().as_str().map_err(zip_error)?,
        ));

        // Entries whose name ends with '/' are directories.
        let entry_is_dir = entry.dir().map_err(zip_error)?;

        let entry_mode = entry
            .unix_permissions()
            .map(|mode| u32::from(mode) & 0o777)
            .filter(|mode| *mode != 0);

        if entry_is_dir {
            // The directory may have been created if iteration is out of order.
            if !path.exists() {
                create_dir_all(&path).await?;
            }
            continue;
        }

        // Parents may be missing if the archive has no directory entries.
        if let Some(parent) = path.parent() {
            if !parent.is_dir() {
                create_dir_all(parent).await?;
            }
        }

        let mut entry_reader = reader
            .reader_without_entry(index)
            .await
            .map_err(zip_error)?;

        let writer = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        futures_lite::io::copy(&mut entry_reader, &mut writer.compat_write()).await?;

        if let Some(mode) = entry_mode {
            set_permissions(&path, Permissions::from_mode(mode)).await?;
        }
    }

    Ok(())
}
