use std::fs;
use std::path::Path;

use codeml_core::{
    read_control_file, write_control_file, Codeml, CodemlError, ControlPaths, ExitCode,
    OptionKey, OptionValue, Options,
};
use codeml_test_support::{write_fixture, SAMPLE_CONTROL_FILE};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample_paths(dir: &Path) -> ControlPaths {
    ControlPaths::new(
        dir.join("alignment.phylip"),
        dir.join("species.tree"),
        dir.join("results.out"),
    )
}

#[test]
fn round_trip_preserves_assigned_options() {
    let temp = TempDir::new().expect("tempdir");
    let ctl = temp.path().join("codeml.ctl");

    let mut options = Options::default();
    options.set("model", OptionValue::Int(1)).unwrap();
    options.set("omega", OptionValue::Real(1.5)).unwrap();
    options.set("aaDist", OptionValue::Text("dat/jones".into())).unwrap();
    options.set("NSsites", OptionValue::from(vec![0, 1, 2])).unwrap();
    options.set("fix_blength", None).unwrap();

    write_control_file(&ctl, &options, &sample_paths(temp.path())).expect("write");
    let loaded = read_control_file(&ctl).expect("read");

    assert_eq!(loaded.options, options);
    assert_eq!(loaded.paths, sample_paths(temp.path()));
}

#[test]
fn text_values_that_are_accepted_read_back_unchanged() {
    let temp = TempDir::new().expect("tempdir");
    let ctl = temp.path().join("codeml.ctl");

    let mut options = Options::unset();
    options
        .set("aaRatefile", OptionValue::from("dat/mtREV24.dat"))
        .unwrap();
    for text in ["dat/a*b.dat", "x\nbogus = 1"] {
        assert!(options.set("aaRatefile", OptionValue::from(text)).is_err());
    }

    write_control_file(&ctl, &options, &sample_paths(temp.path())).expect("write");
    let loaded = read_control_file(&ctl).expect("read");

    assert_eq!(
        loaded.options.get_key(OptionKey::AaRateFile),
        Some(&OptionValue::Text("dat/mtREV24.dat".into()))
    );
    assert_eq!(loaded.options, options);
}

#[test]
fn emitted_lines_are_key_equals_value() {
    let temp = TempDir::new().expect("tempdir");
    let ctl = temp.path().join("codeml.ctl");
    let mut options = Options::default();
    options.set("NSsites", OptionValue::from(vec![0, 1, 2])).unwrap();

    write_control_file(&ctl, &options, &ControlPaths::new("a.phy", "t.nwk", "out.txt"))
        .expect("write");
    let contents = fs::read_to_string(&ctl).expect("read back");

    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(&lines[..3], &["seqfile = a.phy", "outfile = out.txt", "treefile = t.nwk"]);
    assert!(lines.contains(&"NSsites = 0 1 2"));
    assert!(lines.contains(&"omega = 0.4"));
    for line in &lines {
        let (key, value) = line.split_once(" = ").expect("separator");
        assert!(!key.is_empty() && !key.contains(' '), "bad key in {line:?}");
        assert_eq!(value.trim(), value, "stray whitespace in {line:?}");
    }
    assert!(!contents.contains("ndata"));
    assert!(!contents.contains("fix_blength"));
}

#[test]
fn sample_control_file_reads_with_comments_stripped() {
    let temp = TempDir::new().expect("tempdir");
    let ctl = write_fixture(temp.path(), "codeml.ctl", SAMPLE_CONTROL_FILE);

    let loaded = read_control_file(&ctl).expect("read");
    let options = &loaded.options;

    assert_eq!(loaded.paths, ControlPaths::new("alignment.phylip", "species.tree", "results.out"));
    assert_eq!(options.get_key(OptionKey::Noisy), Some(&OptionValue::Int(9)));
    assert_eq!(options.get_key(OptionKey::SeqType), Some(&OptionValue::Int(1)));
    assert_eq!(options.get_key(OptionKey::Omega), Some(&OptionValue::Real(0.4)));
    assert_eq!(options.get_key(OptionKey::SmallDiff), Some(&OptionValue::Real(0.5e-6)));
    assert_eq!(
        options.get_key(OptionKey::NsSites),
        Some(&OptionValue::SiteClasses(vec![0, 1, 2]))
    );
    assert_eq!(options.get_key(OptionKey::AaDist), None);
}

#[test]
fn rereading_resets_keys_the_file_omits() {
    let temp = TempDir::new().expect("tempdir");
    let full = write_fixture(temp.path(), "full.ctl", SAMPLE_CONTROL_FILE);
    let sparse = write_fixture(temp.path(), "sparse.ctl", "model = 2\n");

    let mut job = Codeml::new(temp.path());
    job.read_ctl_file(&full).expect("read full");
    assert_eq!(job.options.get_key(OptionKey::Noisy), Some(&OptionValue::Int(9)));

    job.read_ctl_file(&sparse).expect("read sparse");
    assert_eq!(job.options.get_key(OptionKey::Model), Some(&OptionValue::Int(2)));
    assert_eq!(job.options.get_key(OptionKey::Noisy), None);
    assert_eq!(job.options.assigned().count(), 1);
    // Paths the sparse file does not mention survive.
    assert_eq!(job.paths.tree, Some(temp.path().join("species.tree")));
}

#[test]
fn invalid_control_files_map_to_exit_code_two() {
    let temp = TempDir::new().expect("tempdir");
    let cases = [
        ("malformed.ctl", "model 2\n"),
        ("unknown.ctl", "bogus = 1\n"),
        ("sites.ctl", "NSsites = 0 one 2\n"),
        ("no-sites.ctl", "NSsites =\n"),
    ];
    for (name, contents) in cases {
        let ctl = write_fixture(temp.path(), name, contents);
        let err = read_control_file(&ctl).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::InvalidControlFile, "{name}: {err}");
    }

    let err = read_control_file(&temp.path().join("malformed.ctl")).unwrap_err();
    assert!(matches!(err, CodemlError::MalformedLine { line } if line == "model 2"));
}

#[test]
fn missing_control_file_is_io_and_leaves_job_untouched() {
    let temp = TempDir::new().expect("tempdir");
    let mut job = Codeml::new(temp.path());
    job.options.set("model", OptionValue::Int(1)).unwrap();
    let before = job.options.clone();

    let err = job
        .read_ctl_file(&temp.path().join("absent.ctl"))
        .unwrap_err();
    assert!(matches!(err, CodemlError::Io { .. }));
    assert_eq!(job.options, before);
}

#[test]
fn job_writes_paths_relative_to_working_dir() {
    let temp = TempDir::new().expect("tempdir");
    let work = temp.path().join("work");
    fs::create_dir_all(&work).unwrap();

    let job = Codeml::new(&work).with_paths(ControlPaths::new(
        temp.path().join("data/alignment.phylip"),
        temp.path().join("data/species.tree"),
        work.join("results.out"),
    ));
    job.write_ctl_file().expect("write");

    let contents = fs::read_to_string(work.join("codeml.ctl")).unwrap();
    assert!(contents.contains("seqfile = ../data/alignment.phylip\n"));
    assert!(contents.contains("treefile = ../data/species.tree\n"));
    assert!(contents.contains("outfile = results.out\n"));
}
