//! Formatted terminal output for notebook runs.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::{
    CellOutput, CurveFitCell, FTestCell, GoodnessCell, InterpolationCell, MinimizeCell, NotebookRun,
    RegressionCell, RootsCell,
};
use crate::domain::FittedModel;
use crate::fit::{compute_residuals, DegreeSelection};
use crate::math::{MinResult, RootResult};
use crate::models::formula;
use crate::report::{rank_residuals, Rankings};
use crate::stats::FTestOutcome;

/// Points listed on each side in the residual tables.
const TOP_RESIDUALS: usize = 3;

/// Run banner with the shared settings.
pub fn format_run_header(run: &NotebookRun) -> String {
    let mut out = String::new();
    out.push_str("=== nb - numerical notebook ===\n");
    out.push_str(&format!(
        "Seed: {} | samples: {} | noise: {}\n",
        run.seed, run.sample_count, run.noise
    ));
    out
}

/// Format the full run: header plus one section per cell.
pub fn format_run_summary(run: &NotebookRun) -> String {
    let mut out = format_run_header(run);
    for cell in &run.cells {
        out.push('\n');
        out.push_str(&format_cell(cell));
    }
    out
}

/// Format a single cell section.
pub fn format_cell(cell: &CellOutput) -> String {
    let mut out = format!("--- {} ---\n", cell.kind().display_name());
    out.push_str(&match cell {
        CellOutput::Roots(c) => format_roots(c),
        CellOutput::Minimize(c) => format_minimize(c),
        CellOutput::Regression(c) => format_regression(c),
        CellOutput::Goodness(c) => format_goodness(c),
        CellOutput::CurveFit(c) => format_curve_fit(c),
        CellOutput::Interpolation(c) => format_interpolation(c),
        CellOutput::Ftest(c) => format_ftest_cell(c),
    });
    out
}

/// Result of a single comparator call (the `nb ftest` subcommand).
pub fn format_ftest_outcome(
    ssr_simple: f64,
    ssr_rich: f64,
    dof_simple: usize,
    dof_rich: usize,
    n_observations: usize,
    threshold: f64,
    outcome: &FTestOutcome,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "simple: SSR={ssr_simple} dof={dof_simple} | rich: SSR={ssr_rich} dof={dof_rich} | n={n_observations}\n"
    ));
    out.push_str(&format!(
        "F = {} (d1={}, d2={})\n",
        fmt_f(outcome.f_stat),
        outcome.d1,
        outcome.d2
    ));
    out.push_str(&format!(
        "CL = {:.6} (threshold {threshold})\n",
        outcome.confidence_level
    ));
    out.push_str(&format!("Decision: {}\n", outcome.decision.label()));
    if outcome.is_degenerate() {
        out.push_str("Warning: F is not a positive finite number; check the upstream fits.\n");
    }
    out
}

/// The F-test chain as a table, one row per comparison.
pub fn format_ftest_chain(selection: &DegreeSelection) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:<12} {:>12} {:>12} {:>10} {:>10}  {}\n",
            "simple", "rich", "SSR simple", "SSR rich", "F", "CL", "decision"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<12} {:-<12} {:-<12} {:-<10} {:-<10}  {:-<8}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');
    for s in &selection.steps {
        out.push_str(
            format!(
                "{:<12} {:<12} {:>12.4} {:>12.4} {:>10} {:>10.4}  {}\n",
                s.simple.display_name(),
                s.rich.display_name(),
                s.ssr_simple,
                s.ssr_rich,
                fmt_f(s.outcome.f_stat),
                s.outcome.confidence_level,
                s.outcome.decision.label(),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Format the largest residuals on each side of a fit.
pub fn format_rankings(rankings: &Rankings) -> String {
    let mut out = String::new();
    out.push_str("Largest residuals above the fit:\n");
    out.push_str(&format_residual_rows(&rankings.above));
    out.push_str("Largest residuals below the fit:\n");
    out.push_str(&format_residual_rows(&rankings.below));
    out
}

fn format_roots(c: &RootsCell) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "f(x) = {} on [{}, {}]\n",
        c.function, c.bracket.0, c.bracket.1
    ));
    out.push_str(&root_line("bisection", &c.bisect));
    out.push_str(&root_line("brent", &c.brent));
    out.push_str(&root_line("newton", &c.newton));
    out.push_str(&format!(
        "All roots of {} on [{}, {}]: {}\n",
        c.scan_function,
        c.scan_range.0,
        c.scan_range.1,
        fmt_vec(&c.all_roots.iter().map(|r| r.root).collect::<Vec<_>>())
    ));
    out
}

fn format_minimize(c: &MinimizeCell) -> String {
    let mut out = String::new();
    out.push_str(&format!("f(x) = {}\n", c.function));
    out.push_str(&min_line("golden section [-3, 0]", &c.golden));
    out.push_str(&min_line("brent [-3, 0]", &c.brent));
    out.push_str(&min_line("brent [0, 10] (local)", &c.local));
    out.push_str(&min_line(&format!("grid({}) + brent", c.scan_steps), &c.global));
    out
}

fn format_regression(c: &RegressionCell) -> String {
    let f = &c.fit;
    let mut out = String::new();
    out.push_str(&format!(
        "truth: y = {} + {}·x | n = {}\n",
        c.truth[0], c.truth[1], f.n
    ));
    out.push_str(&format!(
        "slope     = {:.6} ± {:.6}\n",
        f.slope, f.stderr
    ));
    out.push_str(&format!(
        "intercept = {:.6} ± {:.6}\n",
        f.intercept, f.intercept_stderr
    ));
    out.push_str(&format!(
        "r = {:.6} (R² = {:.6}) | p = {:.3e}\n",
        f.r_value,
        f.r_squared(),
        f.p_value
    ));
    out
}

fn format_goodness(c: &GoodnessCell) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} draws from N({}, {}) | fitted N({:.4}, {:.4})\n",
        c.draws.len(),
        c.truth.0,
        c.truth.1,
        c.fitted_mean,
        c.fitted_sd
    ));
    out.push_str(&format!("{:<22} {:>8} {:>9}\n", "bin", "observed", "expected"));
    for b in &c.bins {
        out.push_str(&format!(
            "{:<22} {:>8} {:>9.3}\n",
            format!("[{}, {})", fmt_f(b.lo), fmt_f(b.hi)),
            b.observed,
            b.expected
        ));
    }
    out.push_str(&format!(
        "chi² = {:.4} | dof = {} | p = {:.4}\n",
        c.test.statistic, c.test.dof, c.test.p_value
    ));
    out
}

fn format_curve_fit(c: &CurveFitCell) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} | n = {} | truth {}\n",
        formula(c.fit.model.kind, &c.fit.model.params),
        c.sample.len(),
        fmt_vec(&c.truth)
    ));
    out.push_str(&format_params(&c.fit.model));
    out.push_str(&format!(
        "SSE = {:.6} | RMSE = {:.6} | iterations = {} | converged = {}\n",
        c.fit.quality.sse, c.fit.quality.rmse, c.iterations, c.converged
    ));
    out.push_str(&format!(
        "chi² = {:.4} | dof = {} | reduced = {:.4} | p = {:.4}\n",
        c.chi_square.chi2, c.chi_square.dof, c.chi_square.reduced, c.chi_square.p_value
    ));
    out.push_str("covariance:\n");
    for row in &c.covariance {
        out.push_str(&format!("  {}\n", fmt_vec(row)));
    }
    let residuals = compute_residuals(&c.fit.model, &c.sample);
    out.push_str(&format_rankings(&rank_residuals(&residuals, TOP_RESIDUALS)));
    out
}

fn format_interpolation(c: &InterpolationCell) -> String {
    format!(
        "{} knots of {} | max |error| on {} points: linear = {:.3e}, cubic spline = {:.3e}\n",
        c.knots.len(),
        c.function,
        c.grid.len(),
        c.linear_max_error,
        c.spline_max_error
    )
}

fn format_ftest_cell(c: &FTestCell) -> String {
    let sel = &c.selection;
    let mut out = String::new();
    out.push_str(&format!(
        "Sample: n = {} from a degree-{} polynomial | threshold = {}\n",
        c.sample.len(),
        c.true_degree,
        c.threshold
    ));

    out.push_str("\nModel diagnostics:\n");
    for fit in &sel.fits {
        let chosen = if fit.model.kind == sel.chosen.model.kind { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} {:<12} SSE={:.4} RMSE={:.4} BIC={:.3}\n",
            fit.model.display_name, fit.quality.sse, fit.quality.rmse, fit.quality.bic
        ));
    }
    for (degree, reason) in &sel.skipped {
        out.push_str(&format!("  (skipped degree {degree}) {reason}\n"));
    }

    out.push_str("\nF-test chain:\n");
    out.push_str(&format_ftest_chain(sel));

    out.push_str("\nChosen model:\n");
    out.push_str(&format!(
        "- {} | {}\n",
        sel.chosen.model.display_name,
        formula(sel.chosen.model.kind, &sel.chosen.model.params)
    ));
    out.push_str(&format_params(&sel.chosen.model));
    if sel.bic_choice.model.kind != sel.chosen.model.kind {
        out.push_str(&format!(
            "- BIC would pick {} instead\n",
            sel.bic_choice.model.display_name
        ));
    }
    out
}

fn format_params(model: &FittedModel) -> String {
    let mut out = String::new();
    for ((name, value), err) in model
        .kind
        .param_names()
        .iter()
        .zip(&model.params)
        .zip(&model.stderr)
    {
        out.push_str(&format!("  {name:<3} = {value:>12.6} ± {err:.6}\n"));
    }
    out
}

fn format_residual_rows(rows: &[crate::domain::PointResidual]) -> String {
    if rows.is_empty() {
        return "  (none)\n".to_string();
    }
    let mut out = String::new();
    for r in rows {
        out.push_str(&format!(
            "  x={:>9.4} y={:>10.4} fit={:>10.4} residual={:>+9.4}\n",
            r.x, r.y_obs, r.y_fit, r.residual
        ));
    }
    out
}

fn root_line(method: &str, r: &RootResult) -> String {
    format!(
        "{method:<10} root = {:.12} | f(root) = {:+.2e} | iterations = {}\n",
        r.root, r.f_root, r.iterations
    )
}

fn min_line(method: &str, m: &MinResult) -> String {
    format!(
        "{method:<24} x = {:.8} | f(x) = {:.8} | iterations = {}\n",
        m.x, m.fx, m.iterations
    )
}

fn fmt_f(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        format!("{v:.4}")
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::compare;

    #[test]
    fn ftest_outcome_mentions_decision() {
        let outcome = compare(10.0, 5.0, 1, 2, 51).unwrap();
        let txt = format_ftest_outcome(10.0, 5.0, 1, 2, 51, 0.1, &outcome);
        assert!(txt.contains("F = 49.0000 (d1=1, d2=49)"), "{txt}");
        assert!(txt.contains("Decision: additional parameter justified"));
        assert!(!txt.contains("Warning"));
    }

    #[test]
    fn degenerate_outcome_is_flagged() {
        let outcome = compare(5.0, 6.0, 1, 2, 20).unwrap();
        let txt = format_ftest_outcome(5.0, 6.0, 1, 2, 20, 0.1, &outcome);
        assert!(txt.contains("simpler model sufficient"));
        assert!(txt.contains("Warning"));
    }

    #[test]
    fn infinite_values_print_as_inf() {
        assert_eq!(fmt_f(f64::INFINITY), "inf");
        assert_eq!(fmt_f(f64::NEG_INFINITY), "-inf");
        assert_eq!(fmt_f(0.5), "0.5000");
    }

    #[test]
    fn every_cell_formats_under_its_heading() {
        let run = crate::app::pipeline::run_notebook(&crate::domain::NotebookConfig::default()).unwrap();
        let txt = format_run_summary(&run);
        for kind in crate::domain::CellKind::ALL {
            assert!(txt.contains(&format!("--- {} ---", kind.display_name())), "{kind:?}");
        }
        assert!(txt.contains("F-test chain:"));
    }
}
