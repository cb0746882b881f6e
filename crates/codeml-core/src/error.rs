use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Process exit codes surfaced by the command-line front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    InvalidControlFile = 2,
    InvalidResults = 3,
}

/// Which of the three control-file path fields an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathField {
    Alignment,
    Tree,
    OutFile,
}

impl PathField {
    /// Control-file key the field is written under.
    pub fn key(self) -> &'static str {
        match self {
            PathField::Alignment => "seqfile",
            PathField::Tree => "treefile",
            PathField::OutFile => "outfile",
        }
    }
}

impl std::fmt::Display for PathField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PathField::Alignment => "alignment",
            PathField::Tree => "tree",
            PathField::OutFile => "output file",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum CodemlError {
    #[error("{field} path is not set")]
    Path { field: PathField },

    #[error("{field} path {path} cannot be expressed relative to {working_dir}")]
    UnresolvablePath {
        field: PathField,
        path: PathBuf,
        working_dir: PathBuf,
    },

    #[error("malformed line in control file:\n{line}")]
    MalformedLine { line: String },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid value for option {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("invalid site class: {0}")]
    SiteClass(String),

    #[error("failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("no results could be extracted from {0}")]
    EmptyResult(String),

    #[error("the specified {field} file {path} does not exist")]
    MissingInput { field: PathField, path: PathBuf },

    #[error("failed to launch {command}: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("{command} exited with status {code}")]
    EngineFailed { command: String, code: i32 },
}

impl CodemlError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CodemlError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::MalformedLine { .. }
            | Self::InvalidOption(_)
            | Self::InvalidValue { .. }
            | Self::SiteClass(_) => ExitCode::InvalidControlFile,
            Self::EmptyResult(_) => ExitCode::InvalidResults,
            Self::Path { .. }
            | Self::UnresolvablePath { .. }
            | Self::Io { .. }
            | Self::MissingInput { .. }
            | Self::Spawn { .. }
            | Self::EngineFailed { .. } => ExitCode::Failure,
        }
    }
}

pub type CodemlResult<T> = Result<T, CodemlError>;
