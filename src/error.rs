use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum RecipeError {
    #[error("missing required option '{0}'")]
    MissingOption(&'static str),

    #[error("invalid option '{option}': {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unsupported source url: {0}")]
    UnsupportedUrl(String),

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("extraction of file {archive:?} failed (tempdir: {temp_dir:?}): {reason}")]
    Extraction {
        archive: String,
        temp_dir: PathBuf,
        reason: String,
    },

    #[error(
        "can't strip top level directory of {archive:?}: expected exactly one element, found {entries}"
    )]
    AmbiguousLayout { archive: String, entries: usize },

    #[error("building rabbitmq failed: '{command}' exited with {status}")]
    Build { command: String, status: ExitStatus },

    #[error("failed to render template '{name}': {source}")]
    Template {
        name: &'static str,
        #[source]
        source: tera::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = RecipeError> = std::result::Result<T, E>;
