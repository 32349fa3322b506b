//! Part configuration.
//!
//! The orchestrator hands every part an unordered map of string options plus
//! a handful of shared directories. Both arrive here from a TOML file shaped
//! like a buildout config:
//!
//! ```toml
//! [buildout]
//! parts-directory = "parts"
//! bin-directory = "bin"
//!
//! [rabbitmq]
//! url = "https://example.com/rabbitmq-server-1.7.2.tar.gz"
//! cookie = "secret"
//! ```

use crate::error::{RecipeError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_ERLANG_PATH: &str = "/usr/local/lib/erlang/bin";
pub const DEFAULT_MAKE: &str = "make";
pub const DEFAULT_PYTHON: &str = "python3";

const BUILDOUT_SECTION: &str = "buildout";

/// How launcher scripts end up in the bin directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScriptLayout {
    /// Pick `Env` when the installed tree ships its own scripts, else `Generate`.
    #[default]
    Auto,
    /// Render full `rabbitmq-server` and `rabbitmqctl` launchers.
    Generate,
    /// Render `rabbitmq-env` and symlink the scripts shipped in the part.
    Env,
}

impl FromStr for ScriptLayout {
    type Err = RecipeError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "auto" => Ok(Self::Auto),
            "generate" => Ok(Self::Generate),
            "env" => Ok(Self::Env),
            other => Err(RecipeError::InvalidOption {
                option: "scripts",
                reason: format!("expected one of auto, generate, env but got '{other}'"),
            }),
        }
    }
}

/// Typed view over the recognized part options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub url: String,
    pub location: Option<PathBuf>,
    pub prefix: Option<PathBuf>,
    pub erlang_path: PathBuf,
    pub cookie: Option<String>,
    pub scripts: ScriptLayout,
    pub make: String,
    pub python: String,
    pub python_path: Option<String>,
    pub sha256: Option<String>,
}

impl Options {
    /// Validates a raw option map. Keys this recipe does not know about are
    /// left to the orchestrator and ignored here.
    pub fn from_map(options: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            options
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let url = get("url").ok_or(RecipeError::MissingOption("url"))?;

        let cookie = get("cookie");
        if let Some(cookie) = &cookie {
            validate_cookie(cookie)?;
        }

        let sha256 = match get("sha256") {
            Some(digest) => Some(validate_sha256(&digest)?),
            None => None,
        };

        let scripts = match get("scripts") {
            Some(layout) => layout.parse()?,
            None => ScriptLayout::default(),
        };

        Ok(Self {
            url,
            location: get("location").map(PathBuf::from),
            prefix: get("prefix").map(PathBuf::from),
            erlang_path: get("erlang-path")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ERLANG_PATH)),
            cookie,
            scripts,
            make: get("make").unwrap_or_else(|| DEFAULT_MAKE.to_string()),
            python: get("python").unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
            python_path: get("python-path"),
            sha256,
        })
    }
}

/// The cookie ends up inside a single-quoted Erlang atom which itself sits in
/// a double-quoted shell string.
fn validate_cookie(cookie: &str) -> Result<()> {
    let forbidden = |c: &char| {
        c.is_whitespace() || c.is_control() || matches!(*c, '\'' | '"' | '\\' | '$' | '`')
    };

    if let Some(c) = cookie.chars().find(forbidden) {
        return Err(RecipeError::InvalidOption {
            option: "cookie",
            reason: format!("character {c:?} is not allowed"),
        });
    }

    Ok(())
}

fn validate_sha256(digest: &str) -> Result<String> {
    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RecipeError::InvalidOption {
            option: "sha256",
            reason: "expected 64 hexadecimal characters".to_string(),
        });
    }

    Ok(digest.to_ascii_lowercase())
}

/// Orchestrator-wide directories shared by every part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directories {
    pub directory: PathBuf,
    pub parts: PathBuf,
    pub bin: PathBuf,
    pub downloads: PathBuf,
}

impl Directories {
    /// Default layout rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();

        Self {
            parts: directory.join("parts"),
            bin: directory.join("bin"),
            downloads: directory.join("downloads"),
            directory,
        }
    }
}

/// A single part: its name, the shared directories and its options.
#[derive(Clone, Debug)]
pub struct Part {
    pub name: String,
    pub directories: Directories,
    pub options: Options,
}

impl Part {
    pub fn new(
        name: impl Into<String>,
        directories: Directories,
        options: &HashMap<String, String>,
    ) -> Result<Self> {
        let name = name.into();

        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(RecipeError::Config(format!("invalid part name '{name}'")));
        }

        Ok(Self {
            options: Options::from_map(options)?,
            directories,
            name,
        })
    }

    /// Directory the built broker lives in.
    pub fn destination(&self) -> PathBuf {
        match &self.options.location {
            Some(location) => resolve(&self.directories.directory, location),
            None => self.directories.parts.join(&self.name),
        }
    }

    /// Base for the `etc/` and `var/` paths baked into the launchers.
    pub fn prefix(&self) -> PathBuf {
        match &self.options.prefix {
            Some(prefix) => resolve(&self.directories.directory, prefix),
            None => self.directories.directory.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BuildoutSection {
    directory: Option<PathBuf>,
    parts_directory: Option<PathBuf>,
    bin_directory: Option<PathBuf>,
    downloads_directory: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct BuildoutFile {
    #[serde(default)]
    buildout: BuildoutSection,
    #[serde(flatten)]
    parts: HashMap<String, HashMap<String, toml::Value>>,
}

/// Loads a part from a config file. `part` may be omitted when the file
/// declares exactly one part; `overrides` win over values from the file.
pub async fn load(
    config_path: &Path,
    part: Option<&str>,
    overrides: &[(String, String)],
) -> Result<Part> {
    let contents = tokio::fs::read_to_string(config_path).await?;

    let base = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    parse(&contents, &absolute(&base)?, part, overrides)
}

/// Parses config file contents. Relative directories resolve against `base`.
pub fn parse(
    contents: &str,
    base: &Path,
    part: Option<&str>,
    overrides: &[(String, String)],
) -> Result<Part> {
    let file: BuildoutFile =
        toml::from_str(contents).map_err(|err| RecipeError::Config(err.to_string()))?;

    let name = match part {
        Some(name) => name.to_string(),
        None => {
            let mut names = file
                .parts
                .keys()
                .filter(|name| name.as_str() != BUILDOUT_SECTION)
                .collect::<Vec<_>>();

            if names.len() != 1 {
                names.sort();
                return Err(RecipeError::Config(format!(
                    "expected exactly one part section, found {names:?}; pick one with --part"
                )));
            }

            names[0].clone()
        }
    };

    let section = file
        .parts
        .get(&name)
        .ok_or_else(|| RecipeError::Config(format!("part '{name}' not found")))?;

    let mut options = section
        .iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(value) => value.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect::<HashMap<_, _>>();

    for (key, value) in overrides {
        options.insert(key.clone(), value.clone());
    }

    let directory = match &file.buildout.directory {
        Some(directory) => resolve(base, directory),
        None => base.to_path_buf(),
    };

    let mut directories = Directories::new(&directory);

    if let Some(parts) = &file.buildout.parts_directory {
        directories.parts = resolve(&directory, parts);
    }

    if let Some(bin) = &file.buildout.bin_directory {
        directories.bin = resolve(&directory, bin);
    }

    if let Some(downloads) = &file.buildout.downloads_directory {
        directories.downloads = resolve(&directory, downloads);
    }

    debug!("part '{}' directories: {:?}", name, directories);

    Part::new(name, directories, &options)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    Ok(env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let options = Options::from_map(&options(&[("url", "http://x/rabbit.tar.gz")])).unwrap();

        assert_eq!(options.erlang_path, PathBuf::from(DEFAULT_ERLANG_PATH));
        assert_eq!(options.make, "make");
        assert_eq!(options.python, "python3");
        assert_eq!(options.scripts, ScriptLayout::Auto);
        assert!(options.cookie.is_none());
        assert!(options.location.is_none());
    }

    #[test]
    fn url_is_required() {
        let err = Options::from_map(&options(&[("cookie", "abc")])).unwrap_err();
        assert!(matches!(err, RecipeError::MissingOption("url")));

        let err = Options::from_map(&options(&[("url", "   ")])).unwrap_err();
        assert!(matches!(err, RecipeError::MissingOption("url")));
    }

    #[test]
    fn cookie_rejects_quotes() {
        let err = Options::from_map(&options(&[("url", "x.tgz"), ("cookie", "ab'c")])).unwrap_err();
        assert!(matches!(err, RecipeError::InvalidOption { option: "cookie", .. }));

        let err = Options::from_map(&options(&[("url", "x.tgz"), ("cookie", "a b")])).unwrap_err();
        assert!(matches!(err, RecipeError::InvalidOption { option: "cookie", .. }));
    }

    #[test]
    fn sha256_is_normalized() {
        let digest = "AB".repeat(32);
        let options = Options::from_map(&options(&[("url", "x.tgz"), ("sha256", &digest)])).unwrap();
        assert_eq!(options.sha256, Some("ab".repeat(32)));
    }

    #[test]
    fn unknown_layout() {
        let err = Options::from_map(&options(&[("url", "x.tgz"), ("scripts", "both")])).unwrap_err();
        assert!(matches!(err, RecipeError::InvalidOption { option: "scripts", .. }));
    }

    #[test]
    fn parse_single_part() {
        let contents = indoc! {r#"
            [buildout]
            parts-directory = "build/parts"

            [rabbitmq]
            recipe = "rabbitmq-recipe"
            url = "http://example.com/rabbitmq-server-1.7.2.tar.gz"
            erlang-path = "/opt/erlang/bin"
            location = "/srv/rabbitmq"
        "#};

        let part = parse(contents, Path::new("/work"), None, &[]).unwrap();

        assert_eq!(part.name, "rabbitmq");
        assert_eq!(part.directories.parts, PathBuf::from("/work/build/parts"));
        assert_eq!(part.directories.bin, PathBuf::from("/work/bin"));
        assert_eq!(part.directories.downloads, PathBuf::from("/work/downloads"));
        assert_eq!(part.options.erlang_path, PathBuf::from("/opt/erlang/bin"));
        assert_eq!(part.destination(), PathBuf::from("/srv/rabbitmq"));
        assert_eq!(part.prefix(), PathBuf::from("/work"));
    }

    #[test]
    fn explicit_prefix() {
        let relative = indoc! {r#"
            [rabbitmq]
            url = "a.tgz"
            prefix = "srv/rabbit"
        "#};

        let part = parse(relative, Path::new("/work"), None, &[]).unwrap();
        assert_eq!(part.prefix(), PathBuf::from("/work/srv/rabbit"));
        assert_eq!(part.destination(), PathBuf::from("/work/parts/rabbitmq"));

        let overrides = vec![("prefix".to_string(), "/var/lib/rabbit".to_string())];
        let part = parse(relative, Path::new("/work"), None, &overrides).unwrap();
        assert_eq!(part.prefix(), PathBuf::from("/var/lib/rabbit"));
    }

    #[test]
    fn parse_requires_part_choice() {
        let contents = indoc! {r#"
            [one]
            url = "a.tgz"

            [two]
            url = "b.tgz"
        "#};

        let err = parse(contents, Path::new("/work"), None, &[]).unwrap_err();
        assert!(matches!(err, RecipeError::Config(_)));

        let part = parse(contents, Path::new("/work"), Some("two"), &[]).unwrap();
        assert_eq!(part.options.url, "b.tgz");
        assert_eq!(part.destination(), PathBuf::from("/work/parts/two"));
    }

    #[test]
    fn overrides_win() {
        let contents = indoc! {r#"
            [rabbitmq]
            url = "a.tgz"
            cookie = "one"
        "#};

        let overrides = vec![("cookie".to_string(), "two".to_string())];
        let part = parse(contents, Path::new("/work"), None, &overrides).unwrap();

        assert_eq!(part.options.cookie.as_deref(), Some("two"));
    }

    #[test]
    fn non_string_values() {
        let contents = indoc! {r#"
            [rabbitmq]
            url = "a.tgz"
            cookie = 12345
        "#};

        let part = parse(contents, Path::new("/work"), None, &[]).unwrap();
        assert_eq!(part.options.cookie.as_deref(), Some("12345"));
    }
}
