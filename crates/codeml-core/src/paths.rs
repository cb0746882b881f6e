//! Path handling for control files.
//!
//! CODEML resolves every path in a control file against the directory it is
//! launched from, so user-supplied paths are rewritten relative to the job's
//! working directory before they are written out.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{CodemlError, CodemlResult, PathField};

/// The three file paths every control file starts with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlPaths {
    pub alignment: Option<PathBuf>,
    pub tree: Option<PathBuf>,
    pub out_file: Option<PathBuf>,
}

impl ControlPaths {
    pub fn new(
        alignment: impl Into<PathBuf>,
        tree: impl Into<PathBuf>,
        out_file: impl Into<PathBuf>,
    ) -> Self {
        ControlPaths {
            alignment: Some(alignment.into()),
            tree: Some(tree.into()),
            out_file: Some(out_file.into()),
        }
    }

    pub fn get(&self, field: PathField) -> Option<&Path> {
        match field {
            PathField::Alignment => self.alignment.as_deref(),
            PathField::Tree => self.tree.as_deref(),
            PathField::OutFile => self.out_file.as_deref(),
        }
    }

    /// Return the path for `field`, failing when it has not been set.
    pub fn require(&self, field: PathField) -> CodemlResult<&Path> {
        self.get(field).ok_or(CodemlError::Path { field })
    }

    /// Overwrite only the fields that are set in `other`.
    pub fn update_from(&mut self, other: ControlPaths) {
        if other.alignment.is_some() {
            self.alignment = other.alignment;
        }
        if other.tree.is_some() {
            self.tree = other.tree;
        }
        if other.out_file.is_some() {
            self.out_file = other.out_file;
        }
    }

    /// Rewrite every path relative to `working_dir`.
    ///
    /// All three paths are required; the first missing one is reported.
    pub fn relative_to(&self, working_dir: &Path) -> CodemlResult<ControlPaths> {
        let mut resolved = ControlPaths::default();
        for field in [PathField::Alignment, PathField::Tree, PathField::OutFile] {
            let path = self.require(field)?;
            let relative = resolve(path, working_dir).ok_or_else(|| {
                CodemlError::UnresolvablePath {
                    field,
                    path: path.to_path_buf(),
                    working_dir: working_dir.to_path_buf(),
                }
            })?;
            match field {
                PathField::Alignment => resolved.alignment = Some(relative),
                PathField::Tree => resolved.tree = Some(relative),
                PathField::OutFile => resolved.out_file = Some(relative),
            }
        }
        Ok(resolved)
    }
}

/// Express `path` relative to `working_dir`.
///
/// Relative inputs are interpreted against the process's current directory,
/// as a shell would, before the relative form is computed.
pub fn resolve(path: &Path, working_dir: &Path) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    let target = normalize_path(&absolutize(path, &cwd));
    let base = normalize_path(&absolutize(working_dir, &cwd));
    relative_path(&base, &target)
}

/// Fail with [`CodemlError::MissingInput`] unless `path` exists.
pub fn ensure_exists(field: PathField, path: &Path) -> CodemlResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CodemlError::MissingInput {
            field,
            path: path.to_path_buf(),
        })
    }
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Drop `.` segments and fold `..` into its parent, without touching the
/// filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.components()
        .fold(PathBuf::new(), |mut normalized, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other),
            }
            normalized
        })
}

/// Lexical path leading from directory `from` to `to`.
///
/// Both paths should already be normalised. Returns `None` when they do not
/// share a root (an absolute and a relative path, or two Windows drives).
pub fn relative_path(from: &Path, to: &Path) -> Option<PathBuf> {
    if root_of(from) != root_of(to) {
        return None;
    }

    let mut from_rest = from.components().peekable();
    let mut to_rest = to.components().peekable();
    while let (Some(a), Some(b)) = (from_rest.peek(), to_rest.peek()) {
        if a != b {
            break;
        }
        from_rest.next();
        to_rest.next();
    }

    let mut relative: PathBuf = from_rest.map(|_| Component::ParentDir).collect();
    relative.extend(to_rest);
    if relative.as_os_str().is_empty() {
        relative.push(Component::CurDir);
    }
    Some(relative)
}

fn root_of(path: &Path) -> Option<Component<'_>> {
    path.components()
        .next()
        .filter(|component| matches!(component, Component::Prefix(_) | Component::RootDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_walks_up_and_down() {
        let rel = relative_path(Path::new("/data/run"), Path::new("/data/input/aln.phy")).unwrap();
        assert_eq!(rel, PathBuf::from("../input/aln.phy"));

        let same = relative_path(Path::new("/data/run"), Path::new("/data/run")).unwrap();
        assert_eq!(same, PathBuf::from("."));
    }

    #[test]
    fn relative_path_needs_a_shared_root() {
        assert_eq!(relative_path(Path::new("/data/run"), Path::new("input/aln.phy")), None);
        assert_eq!(
            relative_path(Path::new("run"), Path::new("input/aln.phy")),
            Some(PathBuf::from("../input/aln.phy"))
        );
    }

    #[test]
    fn normalize_drops_dot_segments() {
        let path = normalize_path(Path::new("/data/./run/../input/aln.phy"));
        assert_eq!(path, PathBuf::from("/data/input/aln.phy"));
    }

    #[test]
    fn resolve_handles_absolute_inputs() {
        let rel = resolve(Path::new("/work/in/tree.nwk"), Path::new("/work/run")).unwrap();
        assert_eq!(rel, PathBuf::from("../in/tree.nwk"));
    }

    #[test]
    fn relative_to_reports_first_missing_path() {
        let paths = ControlPaths {
            alignment: Some(PathBuf::from("/w/aln.phy")),
            tree: None,
            out_file: Some(PathBuf::from("/w/out.txt")),
        };
        let err = paths.relative_to(Path::new("/w")).unwrap_err();
        assert!(matches!(
            err,
            CodemlError::Path {
                field: PathField::Tree
            }
        ));
    }

    #[test]
    fn update_from_keeps_unset_fields() {
        let mut paths = ControlPaths::new("a.phy", "t.nwk", "out.txt");
        paths.update_from(ControlPaths {
            tree: Some(PathBuf::from("other.nwk")),
            ..ControlPaths::default()
        });
        assert_eq!(paths.alignment, Some(PathBuf::from("a.phy")));
        assert_eq!(paths.tree, Some(PathBuf::from("other.nwk")));
    }
}
