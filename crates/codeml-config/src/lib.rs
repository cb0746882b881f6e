//! Settings loader for running codeml jobs.
//!
//! Settings resolve through a precedence stack:
//! explicit override file → `.codeml.toml` in the working directory →
//! built-in defaults. Each layer only replaces the fields it sets.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".codeml.toml";
const DEFAULT_COMMAND: &str = "codeml";

/// Settings resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Settings {
    pub engine: EngineSettings,
    pub job: JobSettings,
    pub sources: ConfigSources,
}

/// How the engine executable is invoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub command: String,
    pub verbose: bool,
    pub parse: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobSettings {
    /// Control-file location, when a settings file names one. Relative
    /// values are anchored at that file's directory; otherwise the job's
    /// default inside its working directory applies.
    pub ctl_file: Option<PathBuf>,
}

/// Provenance of the resolved settings.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }
}

/// Kinds of settings sources, lowest precedence first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::Local => "local settings",
            ConfigSourceKind::Override => "override settings",
        };
        f.write_str(label)
    }
}

/// Loader options, usually filled in from command-line flags.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override settings {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read settings {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Settings {
    /// Resolve settings for `options.working_dir` (or the current directory).
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = defaults_layer();
        let mut layers = vec![ConfigSource::default(working_dir.clone())];

        let local_path = working_dir.join(CONFIG_FILE_NAME);
        if local_path.exists() && Some(&local_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_path.clone());
            merged.merge(load_layer(&local_path, &source)?);
            layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, &source)?);
            layers.push(source);
        }

        Ok(merged.finalize(ConfigSources {
            working_directory: working_dir,
            layers,
        }))
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: &ConfigSource) -> Result<PartialSettings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.into(),
        source: err,
    })?;
    let raw: RawSettings = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.into(),
        source: err,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer() -> PartialSettings {
    PartialSettings {
        command: Some(DEFAULT_COMMAND.into()),
        verbose: Some(false),
        parse: Some(true),
        ctl_file: None,
    }
}

#[derive(Clone, Debug, Default)]
struct PartialSettings {
    command: Option<String>,
    verbose: Option<bool>,
    parse: Option<bool>,
    ctl_file: Option<PathBuf>,
}

impl PartialSettings {
    fn merge(&mut self, other: PartialSettings) {
        if other.command.is_some() {
            self.command = other.command;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.parse.is_some() {
            self.parse = other.parse;
        }
        if other.ctl_file.is_some() {
            self.ctl_file = other.ctl_file;
        }
    }

    fn finalize(self, sources: ConfigSources) -> Settings {
        Settings {
            engine: EngineSettings {
                command: self.command.unwrap_or_else(|| DEFAULT_COMMAND.into()),
                verbose: self.verbose.unwrap_or(false),
                parse: self.parse.unwrap_or(true),
            },
            job: JobSettings {
                ctl_file: self.ctl_file,
            },
            sources,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    engine: Option<RawEngine>,
    #[serde(default)]
    job: Option<RawJob>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEngine {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    verbose: Option<bool>,
    #[serde(default)]
    parse: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawJob {
    #[serde(default)]
    ctl_file: Option<PathBuf>,
}

impl RawSettings {
    fn into_partial(self, source: &ConfigSource) -> PartialSettings {
        let mut partial = PartialSettings::default();
        if let Some(engine) = self.engine {
            partial.command = engine.command;
            partial.verbose = engine.verbose;
            partial.parse = engine.parse;
        }
        if let Some(job) = self.job {
            partial.ctl_file = job
                .ctl_file
                .map(|path| make_absolute(&path, &source.base_dir));
        }
        partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<RawSettings, toml::de::Error> {
        toml::from_str(contents)
    }

    #[test]
    fn empty_document_sets_nothing() {
        let partial = parse("")
            .unwrap()
            .into_partial(&ConfigSource::default(PathBuf::from("/work")));
        assert!(partial.command.is_none());
        assert!(partial.ctl_file.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("[engine]\ncommmand = \"codeml\"\n").is_err());
        assert!(parse("[runner]\nverbose = true\n").is_err());
    }

    #[test]
    fn relative_ctl_file_is_anchored_at_the_settings_file() {
        let source =
            ConfigSource::for_file(ConfigSourceKind::Local, PathBuf::from("/work/.codeml.toml"));
        let partial = parse("[job]\nctl_file = \"jobs/m0.ctl\"\n")
            .unwrap()
            .into_partial(&source);
        assert_eq!(partial.ctl_file, Some(PathBuf::from("/work/jobs/m0.ctl")));
    }

    #[test]
    fn later_layers_only_replace_what_they_set() {
        let mut merged = defaults_layer();
        merged.merge(PartialSettings {
            verbose: Some(true),
            ..PartialSettings::default()
        });
        assert_eq!(merged.command.as_deref(), Some("codeml"));
        assert_eq!(merged.verbose, Some(true));
        assert_eq!(merged.parse, Some(true));
    }
}
