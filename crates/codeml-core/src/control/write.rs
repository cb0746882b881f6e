use std::path::Path;

use tracing::debug;

use crate::error::{CodemlResult, PathField};
use crate::fs::write_atomic;
use crate::options::Options;
use crate::paths::ControlPaths;

/// Render a control file for `options`.
///
/// `paths` must already be relative to the engine's working directory; the
/// three path lines come first, in `seqfile`, `outfile`, `treefile` order,
/// followed by every set option in declaration order. Unset options are
/// left out entirely.
pub fn render_control_file(options: &Options, paths: &ControlPaths) -> CodemlResult<String> {
    let mut out = String::new();
    for field in [PathField::Alignment, PathField::OutFile, PathField::Tree] {
        let path = paths.require(field)?;
        out.push_str(&format!("{} = {}\n", field.key(), path.display()));
    }

    for (key, value) in options.assigned() {
        out.push_str(&format!("{key} = {value}\n"));
    }

    Ok(out)
}

/// Write a control file for `options` to `target`.
pub fn write_control_file(
    target: &Path,
    options: &Options,
    paths: &ControlPaths,
) -> CodemlResult<()> {
    let rendered = render_control_file(options, paths)?;
    write_atomic(target, &rendered)?;
    debug!(
        path = %target.display(),
        options = options.assigned().count(),
        "wrote control file"
    );
    Ok(())
}
