use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use codeml_config::{ConfigError, ConfigSourceKind, LoadOptions, Settings};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create settings");
    file.write_all(contents.as_bytes()).expect("write settings");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

fn kinds(settings: &Settings) -> Vec<ConfigSourceKind> {
    settings.sources.layers.iter().map(|layer| layer.kind).collect()
}

#[test]
fn loads_defaults_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let settings = Settings::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect("load defaults");

    assert_eq!(settings.engine.command, "codeml");
    assert!(!settings.engine.verbose);
    assert!(settings.engine.parse);
    assert_eq!(settings.job.ctl_file, None);
    assert_eq!(settings.sources.working_directory, working_dir);
    assert_eq!(kinds(&settings), vec![ConfigSourceKind::Default]);
}

#[test]
fn override_beats_local_which_beats_defaults() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".codeml.toml"),
        "[engine]\ncommand = \"/opt/paml/bin/codeml\"\nverbose = true\n\n[job]\nctl_file = \"m0.ctl\"\n",
    );
    let override_dir = working_dir.join("ci");
    fs::create_dir_all(&override_dir).unwrap();
    write_file(override_dir.join("settings.toml"), "[engine]\nverbose = false\n");

    let settings = Settings::load(
        LoadOptions::default()
            .with_working_dir(&working_dir)
            .with_override_path("ci/settings.toml"),
    )
    .expect("load layered");

    assert_eq!(settings.engine.command, "/opt/paml/bin/codeml");
    assert!(!settings.engine.verbose);
    assert!(settings.engine.parse);
    assert_eq!(settings.job.ctl_file, Some(working_dir.join("m0.ctl")));
    assert_eq!(
        kinds(&settings),
        vec![
            ConfigSourceKind::Default,
            ConfigSourceKind::Local,
            ConfigSourceKind::Override
        ]
    );
}

#[test]
fn missing_override_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let err = Settings::load(
        LoadOptions::default()
            .with_working_dir(temp.path())
            .with_override_path("absent.toml"),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::OverrideNotFound { path } if path.ends_with("absent.toml")));
}

#[test]
fn unknown_keys_fail_to_parse() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path().join(".codeml.toml"), "[engine]\nthreads = 4\n");

    let err = Settings::load(LoadOptions::default().with_working_dir(temp.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
}

#[test]
fn missing_working_dir_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let err = Settings::load(LoadOptions::default().with_working_dir(temp.path().join("gone")))
        .unwrap_err();
    assert!(matches!(err, ConfigError::WorkingDirectory { .. }));
}
