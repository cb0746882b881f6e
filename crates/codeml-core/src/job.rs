use std::path::{Path, PathBuf};

use crate::control::{read_control_file, write_control_file};
use crate::error::CodemlResult;
use crate::options::Options;
use crate::paths::ControlPaths;

/// Default control-file name, as the engine looks for it.
pub const DEFAULT_CTL_FILE: &str = "codeml.ctl";

/// A configured CODEML analysis: options, input/output paths, and where the
/// engine runs.
///
/// Paths are stored as the caller gave them (absolute, or relative to the
/// current directory) and only rewritten relative to the working directory
/// when the control file is written.
#[derive(Clone, Debug)]
pub struct Codeml {
    pub options: Options,
    pub paths: ControlPaths,
    working_dir: PathBuf,
    ctl_file: PathBuf,
}

impl Codeml {
    /// A job running in `working_dir`, with default options and
    /// `codeml.ctl` as its control file.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let ctl_file = working_dir.join(DEFAULT_CTL_FILE);
        Codeml {
            options: Options::default(),
            paths: ControlPaths::default(),
            working_dir,
            ctl_file,
        }
    }

    pub fn with_paths(mut self, paths: ControlPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_ctl_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ctl_file = path.into();
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn ctl_file(&self) -> &Path {
        &self.ctl_file
    }

    /// Write the control file, with paths relative to the working directory.
    pub fn write_ctl_file(&self) -> CodemlResult<()> {
        let relative = self.paths.relative_to(&self.working_dir)?;
        write_control_file(&self.ctl_file, &self.options, &relative)
    }

    /// Load options and paths from an existing control file.
    ///
    /// Options are replaced wholesale: any option the file does not set
    /// becomes unset, even if it had a value before. Path fields are only
    /// updated when the file assigns them, and since the engine reads them
    /// relative to its working directory they are anchored there. On error
    /// nothing is modified.
    pub fn read_ctl_file(&mut self, path: &Path) -> CodemlResult<()> {
        let parsed = read_control_file(path)?;
        let anchored = ControlPaths {
            alignment: parsed.paths.alignment.map(|p| self.anchor(p)),
            tree: parsed.paths.tree.map(|p| self.anchor(p)),
            out_file: parsed.paths.out_file.map(|p| self.anchor(p)),
        };
        self.options = parsed.options;
        self.paths.update_from(anchored);
        Ok(())
    }

    /// Every option and its current value, one per line.
    pub fn print_options(&self) -> String {
        self.options.dump()
    }

    fn anchor(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.working_dir.join(path)
        }
    }
}
