use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CodemlError, CodemlResult};
use crate::fs::read_lines;
use crate::options::{OptionKey, OptionValue, Options};
use crate::paths::ControlPaths;

use super::ControlFile;

const COMMENT_MARKER: char = '*';

/// Read and parse the control file at `path`.
pub fn read_control_file(path: &Path) -> CodemlResult<ControlFile> {
    let lines = read_lines(path)?;
    let parsed = parse_control_file(&lines)?;
    debug!(
        path = %path.display(),
        options = parsed.options.assigned().count(),
        "read control file"
    );
    Ok(parsed)
}

/// Parse control-file lines into a complete option set.
///
/// The result describes the file alone: every option the file does not
/// mention is unset, so applying it replaces rather than merges. Path
/// assignments are returned separately and are only present when the file
/// sets them.
pub fn parse_control_file<S: AsRef<str>>(lines: &[S]) -> CodemlResult<ControlFile> {
    let mut paths = ControlPaths::default();
    let mut pending: HashMap<OptionKey, OptionValue> = HashMap::new();

    for raw_line in lines {
        let line = raw_line.as_ref().trim();
        let uncommented = match line.split_once(COMMENT_MARKER) {
            Some((before, _)) => before,
            None => line,
        };
        if uncommented.trim().is_empty() {
            continue;
        }

        let mut parts = uncommented.split('=');
        let (key, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => {
                return Err(CodemlError::MalformedLine {
                    line: line.to_owned(),
                })
            }
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "seqfile" => paths.alignment = Some(PathBuf::from(value)),
            "treefile" => paths.tree = Some(PathBuf::from(value)),
            "outfile" => paths.out_file = Some(PathBuf::from(value)),
            _ => {
                let key = key.parse::<OptionKey>()?;
                pending.insert(key, OptionValue::parse_for(key, value)?);
            }
        }
    }

    let mut options = Options::unset();
    for (key, value) in pending {
        options.set_key(key, value)?;
    }

    Ok(ControlFile { options, paths })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let lines = [
            "* full comment line",
            "",
            "      seqfile = aln.phy   * alignment",
            "   noisy = 9   * 0,1,2,3,9: how much rubbish on the screen",
            "*  ndata = 10",
        ];
        let parsed = parse_control_file(&lines).unwrap();
        assert_eq!(parsed.paths.alignment, Some(PathBuf::from("aln.phy")));
        assert_eq!(parsed.options.get_key(OptionKey::Noisy), Some(&OptionValue::Int(9)));
        assert_eq!(parsed.options.get_key(OptionKey::NData), None);
    }

    #[test]
    fn values_are_inferred_per_line() {
        let lines = [
            "kappa = 2.5",
            "model = 2.x",
            "aaRatefile = dat/wag.dat",
            "fix_blength = -1",
        ];
        let options = parse_control_file(&lines).unwrap().options;
        assert_eq!(options.get_key(OptionKey::Kappa), Some(&OptionValue::Real(2.5)));
        assert_eq!(
            options.get_key(OptionKey::Model),
            Some(&OptionValue::Text("2.x".into()))
        );
        assert_eq!(
            options.get_key(OptionKey::AaRateFile),
            Some(&OptionValue::Text("dat/wag.dat".into()))
        );
        assert_eq!(
            options.get_key(OptionKey::FixBlength),
            Some(&OptionValue::Int(-1))
        );
    }

    #[test]
    fn missing_separator_reports_the_line() {
        let err = parse_control_file(&["model 2"]).unwrap_err();
        assert!(matches!(err, CodemlError::MalformedLine { line } if line == "model 2"));
    }

    #[test]
    fn repeated_separator_is_malformed() {
        let err = parse_control_file(&["model = 2 = 3"]).unwrap_err();
        assert!(matches!(err, CodemlError::MalformedLine { .. }));
    }

    #[test]
    fn unknown_key_is_named() {
        let err = parse_control_file(&["bogus = 1"]).unwrap_err();
        assert!(matches!(err, CodemlError::InvalidOption(name) if name == "bogus"));
    }

    #[test]
    fn bad_site_class_token_is_named() {
        let err = parse_control_file(&["NSsites = 0 1 two"]).unwrap_err();
        assert!(matches!(err, CodemlError::SiteClass(token) if token == "two"));
    }

    #[test]
    fn later_assignments_win() {
        let options = parse_control_file(&["model = 0", "model = 1"]).unwrap().options;
        assert_eq!(options.get_key(OptionKey::Model), Some(&OptionValue::Int(1)));
    }
}
