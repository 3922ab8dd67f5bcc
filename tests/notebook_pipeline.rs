//! End-to-end checks through the public library API.

use fit_notebook::app::pipeline::{run_cell, run_notebook, CellOutput};
use fit_notebook::data::polynomial_sample;
use fit_notebook::domain::{CellKind, ModelKind, NotebookConfig};
use fit_notebook::fit::select_polynomial;
use fit_notebook::stats::{compare, Decision, FTest};

#[test]
fn comparator_matches_worked_examples() {
    let big = compare(120.0, 80.0, 1, 2, 100).unwrap();
    assert!((big.f_stat - 49.0).abs() < 1e-9);
    assert!(big.confidence_level < 0.10);
    assert_eq!(big.decision, Decision::AdditionalParameterJustified);

    let small = compare(80.5, 80.0, 2, 3, 100).unwrap();
    assert!((small.f_stat - 0.60625).abs() < 1e-9);
    assert!(small.confidence_level > 0.10);
    assert_eq!(small.decision, Decision::SimplerModelSufficient);
}

#[test]
fn comparator_errors_map_to_exit_codes() {
    let nesting: fit_notebook::error::AppError = compare(10.0, 5.0, 2, 2, 50).unwrap_err().into();
    assert_eq!(nesting.exit_code(), 2);

    let data: fit_notebook::error::AppError = compare(10.0, 5.0, 1, 3, 3).unwrap_err().into();
    assert_eq!(data.exit_code(), 3);
}

#[test]
fn same_seed_same_notebook() {
    let config = NotebookConfig::default();
    let a = serde_json::to_string(&run_notebook(&config).unwrap()).unwrap();
    let b = serde_json::to_string(&run_notebook(&config).unwrap()).unwrap();
    assert_eq!(a, b);

    let run = run_notebook(&config).unwrap();
    assert_eq!(run.cells.len(), CellKind::ALL.len());
    for (cell, kind) in run.cells.iter().zip(CellKind::ALL) {
        assert_eq!(cell.kind(), kind);
    }
}

#[test]
fn ftest_cell_detects_the_quadratic_term() {
    let config = NotebookConfig {
        cells: vec![CellKind::Ftest],
        ..NotebookConfig::default()
    };
    let CellOutput::Ftest(cell) = run_cell(CellKind::Ftest, &config).unwrap() else {
        panic!("expected the F-test cell");
    };

    // Line -> quadratic is always the first comparison and the curvature is far above the noise.
    let first = &cell.selection.steps[0];
    assert_eq!(first.simple, ModelKind::Polynomial { degree: 1 });
    assert_eq!(first.rich, ModelKind::Polynomial { degree: 2 });
    assert_eq!(first.outcome.decision, Decision::AdditionalParameterJustified);

    let ModelKind::Polynomial { degree } = cell.selection.chosen.model.kind else {
        panic!("chain picks a polynomial");
    };
    assert!((2..=config.max_degree).contains(&degree));
}

#[test]
fn strict_threshold_never_picks_more_than_a_loose_one() {
    let sample = polynomial_sample(11, 80, 2, 0.5).unwrap();
    let strict = select_polynomial(&sample, 5, &FTest::with_threshold(0.01).unwrap()).unwrap();
    let loose = select_polynomial(&sample, 5, &FTest::with_threshold(0.5).unwrap()).unwrap();
    let degree = |k: ModelKind| k.param_count() - 1;
    assert!(degree(strict.chosen.model.kind) <= degree(loose.chosen.model.kind));
}

#[test]
fn exported_curve_prefers_the_ftest_choice() {
    let config = NotebookConfig {
        cells: vec![CellKind::CurveFit, CellKind::Ftest],
        ..NotebookConfig::default()
    };
    let run = run_notebook(&config).unwrap();
    let (kind, fit, _) = run.exported_fit().unwrap();
    assert_eq!(kind, CellKind::Ftest);
    assert!(fit.model.kind.is_linear());
}
