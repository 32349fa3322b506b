use crate::error::{RecipeError, Result};
use std::path::{Path, PathBuf};
use url::Url;

pub const SERVER_SCRIPT: &str = "rabbitmq-server";
pub const CTL_SCRIPT: &str = "rabbitmqctl";
pub const ENV_SCRIPT: &str = "rabbitmq-env";

// Download paths

/// Last path segment of the url, used as the cache file name.
pub fn get_archive_file_name(url: &str) -> Result<String> {
    let name = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => Path::new(url)
            .file_name()
            .map(|name| name.to_string_lossy().to_string()),
    };

    match name {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name),
        _ => Err(RecipeError::UnsupportedUrl(format!(
            "no file name in url '{url}'"
        ))),
    }
}

pub fn get_archive_path(downloads_dir: &Path, url: &str) -> Result<PathBuf> {
    Ok(downloads_dir.join(get_archive_file_name(url)?))
}

// Bin paths

pub fn get_server_script_path(bin_dir: &Path) -> PathBuf {
    bin_dir.join(SERVER_SCRIPT)
}

pub fn get_ctl_script_path(bin_dir: &Path) -> PathBuf {
    bin_dir.join(CTL_SCRIPT)
}

pub fn get_env_script_path(bin_dir: &Path) -> PathBuf {
    bin_dir.join(ENV_SCRIPT)
}

// Part paths - scripts shipped by the broker itself

pub fn get_shipped_scripts_path(part_dir: &Path) -> PathBuf {
    part_dir.join("scripts")
}

pub fn get_shipped_script_path(part_dir: &Path, name: &str) -> PathBuf {
    get_shipped_scripts_path(part_dir).join(name)
}

pub fn get_ebin_path(part_dir: &Path) -> PathBuf {
    part_dir.join("ebin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_from_http_url() {
        assert_eq!(
            get_archive_file_name("http://www.rabbitmq.com/releases/rabbitmq-server-1.7.2.tar.gz")
                .unwrap(),
            "rabbitmq-server-1.7.2.tar.gz"
        );
    }

    #[test]
    fn archive_name_ignores_query() {
        assert_eq!(
            get_archive_file_name("https://example.com/dist/rabbit.zip?mirror=1").unwrap(),
            "rabbit.zip"
        );
    }

    #[test]
    fn archive_name_from_local_path() {
        assert_eq!(
            get_archive_file_name("/tmp/dist/rabbit.tgz").unwrap(),
            "rabbit.tgz"
        );
    }

    #[test]
    fn archive_name_missing() {
        assert!(get_archive_file_name("https://example.com/").is_err());
    }

    #[test]
    fn bin_paths() {
        let bin = Path::new("/work/bin");
        assert_eq!(get_server_script_path(bin), bin.join("rabbitmq-server"));
        assert_eq!(get_ctl_script_path(bin), bin.join("rabbitmqctl"));
        assert_eq!(get_env_script_path(bin), bin.join("rabbitmq-env"));
    }

    #[test]
    fn shipped_script_in_part() {
        let part = Path::new("/work/parts/rabbitmq");
        assert!(get_shipped_script_path(part, SERVER_SCRIPT).starts_with(part));
    }
}
