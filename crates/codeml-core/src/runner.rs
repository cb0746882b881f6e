use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::info;

use crate::error::{CodemlError, CodemlResult, PathField};
use crate::job::Codeml;
use crate::paths::{ensure_exists, resolve};
use crate::results::{parse_results, CodemlResults};

/// How the engine is invoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Executable name or path.
    pub command: String,
    /// Let the engine write to the terminal instead of discarding its output.
    pub verbose: bool,
    /// Parse the output file once the engine has finished.
    pub parse: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            command: "codeml".into(),
            verbose: false,
            parse: true,
        }
    }
}

/// Runs CODEML jobs.
#[derive(Clone, Debug, Default)]
pub struct Runner {
    options: RunOptions,
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Runner { options }
    }

    /// Write the job's control file, run the engine on it, and parse the
    /// output file unless parsing is disabled.
    pub fn run(&self, job: &Codeml) -> CodemlResult<Option<CodemlResults>> {
        let out_file = check_inputs(job)?;
        job.write_ctl_file()?;
        self.launch(job, &out_file)
    }

    /// Run the engine on the job's existing control file, leaving the file
    /// untouched. The job's paths must match what the file assigns, as they
    /// do after [`Codeml::read_ctl_file`].
    pub fn run_existing(&self, job: &Codeml) -> CodemlResult<Option<CodemlResults>> {
        let out_file = check_inputs(job)?;
        self.launch(job, &out_file)
    }

    fn launch(&self, job: &Codeml, out_file: &Path) -> CodemlResult<Option<CodemlResults>> {
        let ctl_arg = resolve(job.ctl_file(), job.working_dir())
            .unwrap_or_else(|| job.ctl_file().to_path_buf());

        let mut command = Command::new(&self.options.command);
        command.arg(&ctl_arg).current_dir(job.working_dir());
        if !self.options.verbose {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        info!(
            command = %self.options.command,
            ctl_file = %ctl_arg.display(),
            working_dir = %job.working_dir().display(),
            "launching engine"
        );
        let status = command.status().map_err(|source| CodemlError::Spawn {
            command: self.options.command.clone(),
            source,
        })?;
        info!(status = %status, "engine finished");

        if !status.success() {
            return Err(CodemlError::EngineFailed {
                command: self.options.command.clone(),
                code: status.code().unwrap_or(-1),
            });
        }

        if self.options.parse {
            parse_results(out_file).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Both inputs must exist before launch; returns the output file.
fn check_inputs(job: &Codeml) -> CodemlResult<PathBuf> {
    let alignment = job.paths.require(PathField::Alignment)?;
    ensure_exists(PathField::Alignment, alignment)?;
    let tree = job.paths.require(PathField::Tree)?;
    ensure_exists(PathField::Tree, tree)?;
    Ok(job.paths.require(PathField::OutFile)?.to_path_buf())
}
