use codeml_core::{parse_results, parse_results_lines, CodemlError, ExitCode};
use codeml_test_support::{
    write_fixture, AA_DISTANCE_REPORT, EMPTY_REPORT, MULTI_MODEL_REPORT, PAIRWISE_REPORT,
    SINGLE_MODEL_REPORT,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn multi_model_report_yields_models_in_report_order() {
    let temp = TempDir::new().expect("tempdir");
    let report = write_fixture(temp.path(), "results.out", MULTI_MODEL_REPORT);

    let results = parse_results(&report).expect("parse");

    assert_eq!(results.version.as_deref(), Some("4.9j"));
    assert_eq!(results.codon_model.as_deref(), Some("F3x4"));
    assert_eq!(results.site_class_model, None);

    let summary: Vec<(u32, &str, Option<f64>)> = results
        .site_class_models
        .iter()
        .map(|model| (model.number, model.description.as_str(), model.lnl))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, "one-ratio", Some(-902.510018)),
            (1, "NearlyNeutral (2 categories)", Some(-899.101322)),
            (2, "PositiveSelection (3 categories)", Some(-898.87204)),
        ]
    );

    let m0 = results.model_result(0).expect("M0");
    assert_eq!(m0.tree_length, Some(0.04362));
    assert_eq!(m0.parameters.kappa, Some(2.06281));
    assert_eq!(m0.parameters.omega, Some(0.25122));
    assert_eq!(
        m0.parameters.parameter_list.as_deref(),
        Some("0.01262   0.00100   0.03000   2.06281   0.25122")
    );
    assert_eq!(
        m0.ds_tree.as_deref(),
        Some("(1: 0.04000, 2: 0.00300, 3: 0.09000);")
    );
    assert_eq!(
        m0.dn_tree.as_deref(),
        Some("(1: 0.01000, 2: 0.00080, 3: 0.02300);")
    );

    let m2 = results.model_result(2).expect("M2");
    let omegas: Vec<Option<f64>> = m2
        .parameters
        .site_classes
        .iter()
        .map(|class| class.omega)
        .collect();
    assert_eq!(omegas, vec![Some(0.1), Some(1.0), Some(3.1)]);
    assert!(m2.parameters.parameter_list.is_some());
}

#[test]
fn single_model_report_takes_name_from_header() {
    let lines: Vec<&str> = SINGLE_MODEL_REPORT.lines().collect();
    let results = parse_results_lines(&lines).expect("parse");

    assert_eq!(results.version.as_deref(), Some("4.4"));
    assert_eq!(results.site_class_model.as_deref(), Some("NearlyNeutral"));
    assert_eq!(results.site_class_models.len(), 1);

    let model = &results.site_class_models[0];
    assert_eq!(model.number, 1);
    assert_eq!(model.lnl, Some(-899.101322));
    assert_eq!(
        model.parameters.standard_errors.as_deref(),
        Some("0.00200   0.00020   0.00400   0.30000   0.05000   0.02000")
    );
    assert_eq!(model.parameters.site_classes.len(), 2);
    assert_eq!(model.parameters.branches.len(), 2);
    assert_eq!(model.parameters.branches["4..1"].dn, 0.003);
}

#[test]
fn pairwise_report_is_symmetric_and_model_free() {
    let lines: Vec<&str> = PAIRWISE_REPORT.lines().collect();
    let results = parse_results_lines(&lines).expect("parse");

    assert!(results.site_class_models.is_empty());
    assert_eq!(results.pairwise.len(), 3);

    let stats = results
        .pairwise_stats("Homo_sapie", "Gorilla_go")
        .expect("pair");
    assert_eq!(stats, results.pairwise_stats("Gorilla_go", "Homo_sapie").unwrap());
    assert_eq!(stats.lnl, Some(-301.234567));
    assert_eq!(stats.omega, Some(0.25));
    assert_eq!(stats.ds, Some(0.016));
    assert_eq!(
        results.pairwise_stats("Pan_troglo", "Gorilla_go").and_then(|s| s.t),
        Some(0.021)
    );
    assert!(results.pairwise_stats("Homo_sapie", "Homo_sapie").is_none());
}

#[test]
fn distance_report_fills_both_matrices() {
    let lines: Vec<&str> = AA_DISTANCE_REPORT.lines().collect();
    let results = parse_results_lines(&lines).expect("parse");

    assert_eq!(results.distances.raw.len(), 3);
    assert_eq!(results.distances.raw["Homo_sapie"]["Gorilla_go"], 0.0162);
    assert_eq!(results.distances.ml["Pan_troglo"]["Gorilla_go"], 0.0122);
    assert!(results.site_class_models.is_empty());
}

#[test]
fn report_without_landmarks_is_empty_result() {
    let temp = TempDir::new().expect("tempdir");
    let report = write_fixture(temp.path(), "results.out", EMPTY_REPORT);

    let err = parse_results(&report).unwrap_err();
    assert!(matches!(err, CodemlError::EmptyResult(_)));
    assert_eq!(err.exit_code(), ExitCode::InvalidResults);
}

#[test]
fn missing_report_is_io_error() {
    let temp = TempDir::new().expect("tempdir");
    let err = parse_results(&temp.path().join("absent.out")).unwrap_err();
    match err {
        CodemlError::Io { path, .. } => assert!(path.ends_with("absent.out")),
        other => panic!("expected io error, got {other:?}"),
    }
}
