use crate::error::Result;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Writes a fully rendered script and only then marks it executable.
pub async fn write_executable(path: &Path, contents: &str) -> Result<()> {
    remove_existing(path).await?;
    fs::write(path, contents).await?;
    fs::set_permissions(path, Permissions::from_mode(0o755)).await?;

    Ok(())
}

/// Points `link` at `target`, replacing whatever was at `link` before.
pub async fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    remove_existing(link).await?;
    fs::symlink(target, link).await?;

    Ok(())
}

async fn remove_existing(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path).await?,
        Ok(_) => fs::remove_file(path).await?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

/// Moves every top-level entry of `source` into `destination`. Entries are
/// renamed when possible and copied then removed otherwise (e.g. when the
/// temp dir sits on another filesystem).
pub async fn move_dir_contents(source: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    let mut moved = vec![];
    let mut entries = fs::read_dir(source).await?;

    while let Some(entry) = entries.next_entry().await? {
        let from = entry.path();
        let to = destination.join(entry.file_name());

        if let Err(err) = fs::rename(&from, &to).await {
            debug!("rename {:?} -> {:?} failed ({}), copying", from, to, err);

            copy_tree(&from, &to).await?;

            if fs::symlink_metadata(&from).await?.is_dir() {
                fs::remove_dir_all(&from).await?;
            } else {
                fs::remove_file(&from).await?;
            }
        }

        moved.push(to);
    }

    moved.sort();

    Ok(moved)
}

async fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?;
        let target = if relative.as_os_str().is_empty() {
            destination.to_path_buf()
        } else {
            destination.join(relative)
        };

        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).await?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path()).await?;
            fs::symlink(link, &target).await?;
        } else {
            fs::copy(entry.path(), &target).await?;
        }
    }

    Ok(())
}

/// Sorted names of the top-level entries of `path`.
pub async fn list_dir(path: &Path) -> Result<Vec<String>> {
    let mut names = vec![];
    let mut entries = fs::read_dir(path).await?;

    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().to_string());
    }

    names.sort();

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_executable_sets_mode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("script");

        write_executable(&path, "#!/bin/sh\n").await.unwrap();

        let metadata = fs::metadata(&path).await.unwrap();
        assert_eq!(metadata.mode() & 0o777, 0o755);
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "#!/bin/sh\n");
    }

    #[tokio::test]
    async fn write_executable_replaces_symlink() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        let path = tmp.path().join("script");

        fs::write(&target, "original").await.unwrap();
        fs::symlink(&target, &path).await.unwrap();

        write_executable(&path, "new").await.unwrap();

        assert_eq!(fs::read_to_string(&target).await.unwrap(), "original");
        assert!(!fs::symlink_metadata(&path).await.unwrap().is_symlink());
    }

    #[tokio::test]
    async fn replace_symlink_overwrites_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        let link = tmp.path().join("link");

        fs::write(&link, "stale").await.unwrap();
        replace_symlink(&target, &link).await.unwrap();

        assert_eq!(fs::read_link(&link).await.unwrap(), target);
    }

    #[tokio::test]
    async fn move_dir_contents_moves_everything() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        let destination = tmp.path().join("destination");

        fs::create_dir_all(source.join("ebin")).await.unwrap();
        fs::write(source.join("ebin/rabbit.app"), "app").await.unwrap();
        fs::write(source.join("Makefile"), "all:").await.unwrap();
        fs::create_dir(&destination).await.unwrap();

        let moved = move_dir_contents(&source, &destination).await.unwrap();

        assert_eq!(
            moved,
            vec![destination.join("Makefile"), destination.join("ebin")]
        );
        assert!(list_dir(&source).await.unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(destination.join("ebin/rabbit.app"))
                .await
                .unwrap(),
            "app"
        );
    }

    #[tokio::test]
    async fn copy_tree_keeps_links() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        let destination = tmp.path().join("destination");

        fs::create_dir_all(source.join("scripts")).await.unwrap();
        fs::write(source.join("scripts/rabbitmq-server"), "#!/bin/sh")
            .await
            .unwrap();
        fs::symlink("rabbitmq-server", source.join("scripts/alias"))
            .await
            .unwrap();

        copy_tree(&source, &destination).await.unwrap();

        assert_eq!(
            fs::read_link(destination.join("scripts/alias")).await.unwrap(),
            PathBuf::from("rabbitmq-server")
        );
        assert!(destination.join("scripts/rabbitmq-server").is_file());
    }
}
