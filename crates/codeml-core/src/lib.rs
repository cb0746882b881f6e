pub mod control;
pub mod error;
pub mod fs;
pub mod job;
pub mod options;
pub mod paths;
pub mod results;
pub mod runner;

pub use control::{
    parse_control_file, read_control_file, render_control_file, write_control_file, ControlFile,
};
pub use error::{CodemlError, CodemlResult, ExitCode, PathField};
pub use job::{Codeml, DEFAULT_CTL_FILE};
pub use options::{OptionKey, OptionValue, Options, ValueKind};
pub use paths::ControlPaths;
pub use results::{parse_results, parse_results_lines, CodemlResults, SiteClassModel};
pub use runner::{RunOptions, Runner};
