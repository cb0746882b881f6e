//! Reading and writing CODEML control files.
//!
//! A control file is a list of `key = value` lines. Anything after a `*` is
//! a comment. The first three assignments name the alignment, output and
//! tree files; every other key must be one of [`OptionKey`].
//!
//! [`OptionKey`]: crate::options::OptionKey

mod read;
mod write;

pub use read::{parse_control_file, read_control_file};
pub use write::{render_control_file, write_control_file};

use crate::options::Options;
use crate::paths::ControlPaths;

/// Contents of a parsed control file.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlFile {
    /// Every option, with those the file does not mention unset.
    pub options: Options,
    /// Paths the file assigns; unassigned ones are `None`.
    pub paths: ControlPaths,
}
