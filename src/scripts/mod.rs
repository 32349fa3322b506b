//! Launcher scripts for the bin directory.
//!
//! Two layouts exist. Older broker releases ship no usable launchers, so full
//! `rabbitmq-server` and `rabbitmqctl` scripts are rendered. Newer releases
//! ship their own under `<part>/scripts`; those get symlinked and only the
//! `rabbitmq-env` file they source is rendered.

use crate::config::{Part, ScriptLayout};
use crate::error::{RecipeError, Result};
use crate::store::{self, files, paths};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tera::Tera;
use tracing::info;

mod ctl;
mod env;
mod server;

/// Values substituted into the templates. Every value is checked before any
/// rendering happens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScriptContext {
    pub part: String,
    pub ebin: String,
    pub prefix: String,
    pub erlang_path: String,
    pub cookie: Option<String>,
}

impl ScriptContext {
    pub fn new(part_dir: &Path, prefix: &Path, erlang_path: &Path, cookie: Option<&str>) -> Result<Self> {
        Ok(Self {
            part: shell_path("location", part_dir)?,
            ebin: shell_path("location", &paths::get_ebin_path(part_dir))?,
            prefix: shell_word("prefix", prefix)?,
            erlang_path: shell_path("erlang-path", erlang_path)?,
            cookie: cookie.map(str::to_string),
        })
    }

    pub fn from_part(part: &Part) -> Result<Self> {
        Self::new(
            &part.destination(),
            &part.prefix(),
            &part.options.erlang_path,
            part.options.cookie.as_deref(),
        )
    }
}

/// Paths are pasted inside double quotes, so anything the shell would still
/// expand there is refused.
fn shell_path(option: &'static str, path: &Path) -> Result<String> {
    let value = path.to_str().ok_or_else(|| RecipeError::InvalidOption {
        option,
        reason: format!("{path:?} is not valid UTF-8"),
    })?;

    if let Some(c) = value
        .chars()
        .find(|c| c.is_control() || matches!(*c, '"' | '$' | '`' | '\\'))
    {
        return Err(RecipeError::InvalidOption {
            option,
            reason: format!("{path:?} contains {c:?}"),
        });
    }

    Ok(value.to_string())
}

/// The prefix also feeds variables like `RABBITMQ_CLUSTER_CONFIG_OPTION` that
/// the server launcher expands unquoted, so it must be a single word.
fn shell_word(option: &'static str, path: &Path) -> Result<String> {
    let value = shell_path(option, path)?;

    if value.contains(char::is_whitespace) {
        return Err(RecipeError::InvalidOption {
            option,
            reason: format!("{path:?} contains whitespace"),
        });
    }

    Ok(value)
}

fn render(name: &'static str, template: &str, context: &ScriptContext) -> Result<String> {
    let template_error = |source| RecipeError::Template { name, source };

    let mut tera = Tera::default();
    tera.add_raw_template(name, template)
        .map_err(template_error)?;

    let context = tera::Context::from_serialize(context).map_err(template_error)?;

    tera.render(name, &context).map_err(template_error)
}

pub fn render_server(context: &ScriptContext) -> Result<String> {
    render(paths::SERVER_SCRIPT, server::TEMPLATE, context)
}

pub fn render_ctl(context: &ScriptContext) -> Result<String> {
    render(paths::CTL_SCRIPT, ctl::TEMPLATE, context)
}

pub fn render_env(context: &ScriptContext) -> Result<String> {
    render(paths::ENV_SCRIPT, env::TEMPLATE, context)
}

/// Turns `Auto` into a concrete layout by looking at the installed tree.
pub fn resolve_layout(layout: ScriptLayout, part_dir: &Path) -> ScriptLayout {
    match layout {
        ScriptLayout::Auto => {
            if paths::get_shipped_script_path(part_dir, paths::SERVER_SCRIPT).is_file() {
                ScriptLayout::Env
            } else {
                ScriptLayout::Generate
            }
        }
        other => other,
    }
}

/// Writes the bin directory entries for `part` and returns their paths in
/// the order server, ctl, env.
pub async fn generate(part: &Part) -> Result<Vec<PathBuf>> {
    let part_dir = part.destination();
    let bin_dir = &part.directories.bin;
    let context = ScriptContext::from_part(part)?;
    let layout = resolve_layout(part.options.scripts, &part_dir);

    store::ensure_dir(bin_dir).await?;

    let server_path = paths::get_server_script_path(bin_dir);
    let ctl_path = paths::get_ctl_script_path(bin_dir);

    match layout {
        ScriptLayout::Env => {
            let env_path = paths::get_env_script_path(bin_dir);
            let env_script = render_env(&context)?;

            let shipped = [paths::SERVER_SCRIPT, paths::CTL_SCRIPT]
                .map(|name| paths::get_shipped_script_path(&part_dir, name));

            if let Some(missing) = shipped.iter().find(|path| !path.is_file()) {
                return Err(RecipeError::Config(format!(
                    "scripts = env but {missing:?} does not exist"
                )));
            }

            files::replace_symlink(&shipped[0], &server_path).await?;
            files::replace_symlink(&shipped[1], &ctl_path).await?;
            files::write_executable(&env_path, &env_script).await?;

            info!("linked shipped scripts into {:?}", bin_dir);

            Ok(vec![server_path, ctl_path, env_path])
        }
        _ => {
            let server_script = render_server(&context)?;
            let ctl_script = render_ctl(&context)?;

            files::write_executable(&server_path, &server_script).await?;
            files::write_executable(&ctl_path, &ctl_script).await?;

            info!("generated scripts in {:?}", bin_dir);

            Ok(vec![server_path, ctl_path])
        }
    }
}
