use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{CodemlError, CodemlResult};

/// Replace `path` with `content` via a sibling temporary file.
///
/// The handle is closed before the rename, and the temporary file is removed
/// again if any step fails, so `path` is either untouched or fully written.
pub fn write_atomic(path: &Path, content: &str) -> CodemlResult<()> {
    let tmp_path = unique_tmp_path(path);
    if let Err(err) = write_and_sync(&tmp_path, content) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CodemlError::io(path, err));
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CodemlError::io(path, err));
    }

    Ok(())
}

/// Read every line of `path`, with line terminators stripped.
pub fn read_lines(path: &Path) -> CodemlResult<Vec<String>> {
    let file = File::open(path).map_err(|err| CodemlError::io(path, err))?;
    let mut reader = BufReader::new(file);
    let mut lines = Vec::new();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = reader
            .read_line(&mut buffer)
            .map_err(|err| CodemlError::io(path, err))?;
        if bytes_read == 0 {
            break;
        }

        if buffer.ends_with('\n') {
            buffer.pop();
            if buffer.ends_with('\r') {
                buffer.pop();
            }
        }
        lines.push(buffer.clone());
    }

    Ok(lines)
}

fn write_and_sync(path: &Path, content: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

// Hidden sibling such as `.codeml.ctl.0.tmp`, so the rename never crosses
// filesystems.
fn unique_tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (0u32..)
        .map(|attempt| path.with_file_name(format!(".{name}.{attempt}.tmp")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.with_file_name(format!(".{name}.tmp")))
}
