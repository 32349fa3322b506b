use crate::config::Options;
use crate::error::{RecipeError, Result};
use crate::store::files;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::io;
use std::process::Stdio;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

/// Ambient context for one build command: working directory, extra `PATH`
/// entries and variables. It is applied to the child process only, so the
/// recipe's own cwd and environment are never touched and nothing needs
/// restoring afterwards, whichever way the build ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    pub current_dir: PathBuf,
    pub bin_paths: Vec<PathBuf>,
    pub vars: Vec<(String, String)>,
}

impl BuildEnvironment {
    pub fn from_options(options: &Options, current_dir: &Path) -> Self {
        let mut vars = vec![];

        if let Some(python_path) = &options.python_path {
            vars.push(("PYTHONPATH".to_string(), python_path.clone()));
        }

        Self {
            current_dir: current_dir.to_path_buf(),
            bin_paths: vec![options.erlang_path.clone()],
            vars,
        }
    }

    /// `bin_paths` followed by the inherited `PATH`.
    pub fn path(&self) -> Result<OsString> {
        let inherited = env::var_os("PATH").unwrap_or_default();

        let paths = self
            .bin_paths
            .iter()
            .cloned()
            .chain(env::split_paths(&inherited))
            .collect::<Vec<_>>();

        env::join_paths(paths).map_err(|err| RecipeError::InvalidOption {
            option: "erlang-path",
            reason: err.to_string(),
        })
    }

    pub fn apply(&self, command: &mut Command) -> Result<()> {
        command.current_dir(&self.current_dir);

        for (key, value) in &self.vars {
            command.env(key, value);
        }

        command.env("PATH", self.path()?);

        Ok(())
    }
}

/// `make PYTHON=<python>` run inside the part directory.
pub fn build_command(options: &Options, part_dir: &Path) -> Result<Command> {
    let mut command = Command::new(&options.make);

    command.arg(format!("PYTHON={}", options.python));

    BuildEnvironment::from_options(options, part_dir).apply(&mut command)?;

    // stdout belongs to the caller's path list; build output goes to the log
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    Ok(command)
}

pub async fn build(options: &Options, part_dir: &Path) -> Result<()> {
    let mut command = build_command(options, part_dir)?;

    info!("building in {:?}: {} PYTHON={}", part_dir, options.make, options.python);

    let mut child = command.spawn()?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(io::Error::other("build output is not piped").into());
    };

    let stdout = LinesStream::new(BufReader::new(stdout).lines());
    let stderr = LinesStream::new(BufReader::new(stderr).lines());

    let mut merged = StreamExt::merge(stdout, stderr);

    while let Some(line) = merged.next().await {
        info!("{}: {}", options.make, line?.trim_end());
    }

    let status = child.wait().await?;

    if !status.success() {
        return Err(RecipeError::Build {
            command: options.make.clone(),
            status,
        });
    }

    Ok(())
}

/// Moves `source_root` into `part_dir` and builds it there. Does nothing and
/// returns `false` when `part_dir` already exists. A failed move or build
/// removes `part_dir` again so the next run does not mistake it for a
/// finished install.
pub async fn install(options: &Options, source_root: &Path, part_dir: &Path) -> Result<bool> {
    if part_dir.exists() {
        info!("rabbitmq already installed: {:?}", part_dir);
        return Ok(false);
    }

    if let Some(parent) = part_dir.parent() {
        fs::create_dir_all(parent).await?;
    }

    fs::create_dir(part_dir).await?;

    let installed = async {
        files::move_dir_contents(source_root, part_dir).await?;
        build(options, part_dir).await
    }
    .await;

    if let Err(err) = installed {
        warn!("removing incomplete install: {:?}", part_dir);

        if let Err(cleanup) = fs::remove_dir_all(part_dir).await {
            warn!("failed to remove {:?}: {}", part_dir, cleanup);
        }

        return Err(err);
    }

    Ok(true)
}
