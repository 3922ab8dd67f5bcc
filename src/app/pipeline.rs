//! Shared notebook pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! seeded data -> numerical routine -> summary values -> plot series
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info};

use crate::data::{
    cell_seed, curve_sample, knots, linear_sample, linspace, normal_draws, polynomial_sample,
    DRAW_TRUTH, EXP_DECAY_TRUTH, GAUSSIAN_TRUTH, LINE_TRUTH,
};
use crate::domain::{
    CellKind, CellPlot, Curve, CurveShape, FitResult, NotebookConfig, Sample,
};
use crate::error::AppError;
use crate::fit::{compute_residuals, fit_nonlinear, fitted_grid, select_polynomial, DegreeSelection, LmOptions};
use crate::math::{
    bisect, brent_minimize, brent_root, find_roots, golden_section, minimize_global, newton,
    CubicSpline, LinearInterp, MinResult, RootResult,
};
use crate::stats::{
    chisquare, linregress, reduced_chi_square, ChiSquareOutcome, FTest, LinRegress, ReducedChiSquare,
};

const SOLVER_TOL: f64 = 1e-12;
const SOLVER_MAX_ITER: usize = 200;
/// Points on every fitted-curve grid.
const CURVE_GRID: usize = 200;

/// Classic textbook cubic with a single real root near 2.0946.
pub const CUBIC_LABEL: &str = "x^3 - 2x - 5";
/// A parabola with wiggles: two roots, one global and one local minimum.
pub const WAVY_LABEL: &str = "x^2 + 10 sin(x)";
pub const WAVY_RANGE: (f64, f64) = (-10.0, 10.0);

pub fn cubic(x: f64) -> f64 {
    x * x * x - 2.0 * x - 5.0
}

fn cubic_prime(x: f64) -> f64 {
    3.0 * x * x - 2.0
}

pub fn wavy(x: f64) -> f64 {
    x * x + 10.0 * x.sin()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootsCell {
    pub function: String,
    pub bracket: (f64, f64),
    pub bisect: RootResult,
    pub brent: RootResult,
    pub newton: RootResult,
    /// Every root of the wavy function on its range.
    pub scan_function: String,
    pub scan_range: (f64, f64),
    pub all_roots: Vec<RootResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimizeCell {
    pub function: String,
    pub golden: MinResult,
    pub brent: MinResult,
    /// Bounded Brent on a bracket that only holds the local minimum.
    pub local: MinResult,
    pub global: MinResult,
    pub scan_steps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionCell {
    pub sample: Sample,
    pub truth: [f64; 2],
    pub fit: LinRegress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub observed: f64,
    pub expected: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodnessCell {
    pub draws: Vec<f64>,
    pub truth: (f64, f64),
    pub fitted_mean: f64,
    pub fitted_sd: f64,
    pub bins: Vec<HistogramBin>,
    pub test: ChiSquareOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFitCell {
    pub shape: CurveShape,
    pub truth: Vec<f64>,
    pub sample: Sample,
    pub fit: FitResult,
    pub covariance: Vec<Vec<f64>>,
    pub iterations: usize,
    pub converged: bool,
    pub chi_square: ReducedChiSquare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolationCell {
    pub function: String,
    pub knots: Sample,
    pub grid: Vec<f64>,
    pub linear: Vec<f64>,
    pub spline: Vec<f64>,
    pub linear_max_error: f64,
    pub spline_max_error: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FTestCell {
    pub sample: Sample,
    pub true_degree: usize,
    pub threshold: f64,
    pub selection: DegreeSelection,
}

/// Output of one cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cell", rename_all = "kebab-case")]
pub enum CellOutput {
    Roots(RootsCell),
    Minimize(MinimizeCell),
    Regression(RegressionCell),
    Goodness(GoodnessCell),
    CurveFit(CurveFitCell),
    Interpolation(InterpolationCell),
    Ftest(FTestCell),
}

impl CellOutput {
    pub fn kind(&self) -> CellKind {
        match self {
            CellOutput::Roots(_) => CellKind::Roots,
            CellOutput::Minimize(_) => CellKind::Minimize,
            CellOutput::Regression(_) => CellKind::Regression,
            CellOutput::Goodness(_) => CellKind::Goodness,
            CellOutput::CurveFit(_) => CellKind::CurveFit,
            CellOutput::Interpolation(_) => CellKind::Interpolation,
            CellOutput::Ftest(_) => CellKind::Ftest,
        }
    }

    /// Scatter points and curves for this cell.
    pub fn plot(&self) -> CellPlot {
        match self {
            CellOutput::Roots(c) => plot_roots(c),
            CellOutput::Minimize(c) => plot_minimize(c),
            CellOutput::Regression(c) => plot_regression(c),
            CellOutput::Goodness(c) => plot_goodness(c),
            CellOutput::CurveFit(c) => plot_fit(
                &format!("{} fit", c.fit.model.display_name),
                &c.sample,
                &c.fit,
            ),
            CellOutput::Interpolation(c) => plot_interpolation(c),
            CellOutput::Ftest(c) => plot_fit(
                &format!("F-test choice: {}", c.selection.chosen.model.display_name),
                &c.sample,
                &c.selection.chosen,
            ),
        }
    }

    /// The fitted model of this cell and the sample it was fitted to, for
    /// cells that produce one.
    pub fn fit(&self) -> Option<(&FitResult, &Sample)> {
        match self {
            CellOutput::CurveFit(c) => Some((&c.fit, &c.sample)),
            CellOutput::Ftest(c) => Some((&c.selection.chosen, &c.sample)),
            _ => None,
        }
    }
}

/// All computed outputs of a notebook run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookRun {
    pub seed: u64,
    pub sample_count: usize,
    pub noise: f64,
    pub cells: Vec<CellOutput>,
}

impl NotebookRun {
    pub fn cell(&self, kind: CellKind) -> Option<&CellOutput> {
        self.cells.iter().find(|c| c.kind() == kind)
    }

    /// The fit written by `--export-curve`: the F-test choice, else the curve fit.
    pub fn exported_fit(&self) -> Option<(CellKind, &FitResult, &Sample)> {
        [CellKind::Ftest, CellKind::CurveFit]
            .into_iter()
            .find_map(|k| self.cell(k).and_then(|c| c.fit()).map(|(f, s)| (k, f, s)))
    }
}

/// Run every configured cell, in order.
pub fn run_notebook(config: &NotebookConfig) -> Result<NotebookRun, AppError> {
    if config.cells.is_empty() {
        return Err(AppError::invalid_input("No cells selected."));
    }
    let mut cells = Vec::with_capacity(config.cells.len());
    for &kind in &config.cells {
        cells.push(run_cell(kind, config)?);
    }
    info!(cells = cells.len(), seed = config.sample_seed, "notebook run complete");
    Ok(NotebookRun {
        seed: config.sample_seed,
        sample_count: config.sample_count,
        noise: config.noise,
        cells,
    })
}

/// Run a single cell.
pub fn run_cell(kind: CellKind, config: &NotebookConfig) -> Result<CellOutput, AppError> {
    let seed = cell_seed(config.sample_seed, kind);
    debug!(cell = kind.display_name(), seed, "running cell");
    Ok(match kind {
        CellKind::Roots => CellOutput::Roots(roots_cell(config)?),
        CellKind::Minimize => CellOutput::Minimize(minimize_cell(config)?),
        CellKind::Regression => CellOutput::Regression(regression_cell(seed, config)?),
        CellKind::Goodness => CellOutput::Goodness(goodness_cell(seed, config)?),
        CellKind::CurveFit => CellOutput::CurveFit(curve_fit_cell(seed, config)?),
        CellKind::Interpolation => CellOutput::Interpolation(interpolation_cell(config)?),
        CellKind::Ftest => CellOutput::Ftest(ftest_cell(seed, config)?),
    })
}

fn roots_cell(config: &NotebookConfig) -> Result<RootsCell, AppError> {
    let bracket = (2.0, 3.0);
    let bisect = bisect(cubic, bracket.0, bracket.1, SOLVER_TOL, SOLVER_MAX_ITER)?;
    let brent = brent_root(cubic, bracket.0, bracket.1, SOLVER_TOL, SOLVER_MAX_ITER)?;
    let newton = newton(cubic, cubic_prime, 2.0, SOLVER_TOL, SOLVER_MAX_ITER)?;
    debug!(
        bisect = bisect.iterations,
        brent = brent.iterations,
        newton = newton.iterations,
        "root iterations"
    );

    let all_roots = find_roots(wavy, WAVY_RANGE.0, WAVY_RANGE.1, config.scan_steps, SOLVER_TOL)?;
    Ok(RootsCell {
        function: CUBIC_LABEL.to_string(),
        bracket,
        bisect,
        brent,
        newton,
        scan_function: WAVY_LABEL.to_string(),
        scan_range: WAVY_RANGE,
        all_roots,
    })
}

fn minimize_cell(config: &NotebookConfig) -> Result<MinimizeCell, AppError> {
    let golden = golden_section(wavy, -3.0, 0.0, 1e-8, SOLVER_MAX_ITER)?;
    let brent = brent_minimize(wavy, -3.0, 0.0, 1e-8, SOLVER_MAX_ITER)?;
    let local = brent_minimize(wavy, 0.0, WAVY_RANGE.1, 1e-8, SOLVER_MAX_ITER)?;
    let global = minimize_global(wavy, WAVY_RANGE.0, WAVY_RANGE.1, config.scan_steps, 1e-8)?;
    Ok(MinimizeCell {
        function: WAVY_LABEL.to_string(),
        golden,
        brent,
        local,
        global,
        scan_steps: config.scan_steps,
    })
}

fn regression_cell(seed: u64, config: &NotebookConfig) -> Result<RegressionCell, AppError> {
    let sample = linear_sample(seed, config.sample_count, config.noise)?;
    let fit = linregress(&sample.x, &sample.y)?;
    Ok(RegressionCell {
        sample,
        truth: LINE_TRUTH,
        fit,
    })
}

fn goodness_cell(seed: u64, config: &NotebookConfig) -> Result<GoodnessCell, AppError> {
    let (mean, sd) = DRAW_TRUTH;
    let draws = normal_draws(seed, config.sample_count, mean, sd)?;
    let n = draws.len() as f64;

    let fitted_mean = draws.iter().sum::<f64>() / n;
    let fitted_sd = (draws.iter().map(|d| (d - fitted_mean).powi(2)).sum::<f64>() / n).sqrt();
    let fitted = Normal::new(fitted_mean, fitted_sd)
        .map_err(|e| AppError::insufficient_data(format!("Cannot fit a normal to the draws: {e}")))?;

    // Equal-probability bins under the fitted normal; the outer ones are open.
    let k = (draws.len() / 10).clamp(4, 20);
    let mut edges = Vec::with_capacity(k + 1);
    edges.push(f64::NEG_INFINITY);
    edges.extend((1..k).map(|i| fitted.inverse_cdf(i as f64 / k as f64)));
    edges.push(f64::INFINITY);

    let mut bins: Vec<HistogramBin> = edges
        .windows(2)
        .map(|w| HistogramBin {
            lo: w[0],
            hi: w[1],
            observed: 0.0,
            expected: n * (fitted.cdf(w[1]) - fitted.cdf(w[0])),
        })
        .collect();
    for &d in &draws {
        let idx = edges[1..k].partition_point(|&e| e <= d);
        bins[idx].observed += 1.0;
    }
    let expected_total: f64 = bins.iter().map(|b| b.expected).sum();
    for b in &mut bins {
        b.expected *= n / expected_total;
    }

    let observed: Vec<f64> = bins.iter().map(|b| b.observed).collect();
    let expected: Vec<f64> = bins.iter().map(|b| b.expected).collect();
    // Mean and sd were estimated from the same draws.
    let test = chisquare(&observed, &expected, 2)?;

    Ok(GoodnessCell {
        draws,
        truth: DRAW_TRUTH,
        fitted_mean,
        fitted_sd,
        bins,
        test,
    })
}

fn curve_fit_cell(seed: u64, config: &NotebookConfig) -> Result<CurveFitCell, AppError> {
    let shape = config.curve_shape;
    let sample = curve_sample(seed, config.sample_count, shape, config.noise)?;
    let (fit, raw) = fit_nonlinear(shape.model_kind(), &sample, config.curve_starts, &LmOptions::default())?;

    let residuals: Vec<f64> = compute_residuals(&fit.model, &sample)
        .iter()
        .map(|r| r.residual)
        .collect();
    let sigma = sample.sigma.clone().unwrap_or_else(|| vec![1.0; sample.len()]);
    let chi_square = reduced_chi_square(&residuals, &sigma, fit.model.kind.param_count())?;

    let truth = match shape {
        CurveShape::ExpDecay => EXP_DECAY_TRUTH.to_vec(),
        CurveShape::Gaussian => GAUSSIAN_TRUTH.to_vec(),
    };
    Ok(CurveFitCell {
        shape,
        truth,
        sample,
        fit,
        covariance: raw.covariance,
        iterations: raw.iterations,
        converged: raw.converged,
        chi_square,
    })
}

fn interpolation_cell(config: &NotebookConfig) -> Result<InterpolationCell, AppError> {
    let (a, b) = (0.0, 2.0 * std::f64::consts::PI);
    let knots = knots(f64::sin, a, b, config.interp_knots)?;
    let linear_interp = LinearInterp::new(&knots.x, &knots.y)?;
    let spline = CubicSpline::natural(&knots.x, &knots.y)?;

    let grid = linspace(a, b, CURVE_GRID);
    let linear: Vec<f64> = grid.iter().map(|&x| linear_interp.eval(x)).collect();
    let spline_y: Vec<f64> = grid.iter().map(|&x| spline.eval(x)).collect();
    let max_error = |ys: &[f64]| {
        grid.iter()
            .zip(ys)
            .map(|(&x, &y)| (y - x.sin()).abs())
            .fold(0.0, f64::max)
    };
    let linear_max_error = max_error(&linear);
    let spline_max_error = max_error(&spline_y);

    Ok(InterpolationCell {
        function: "sin(x)".to_string(),
        knots,
        grid,
        linear,
        spline: spline_y,
        linear_max_error,
        spline_max_error,
    })
}

fn ftest_cell(seed: u64, config: &NotebookConfig) -> Result<FTestCell, AppError> {
    let test = FTest::with_threshold(config.ftest_threshold)?;
    let sample = polynomial_sample(seed, config.sample_count, config.true_degree, config.noise)?;
    let selection = select_polynomial(&sample, config.max_degree, &test)?;
    Ok(FTestCell {
        sample,
        true_degree: config.true_degree,
        threshold: test.threshold(),
        selection,
    })
}

fn plot_roots(c: &RootsCell) -> CellPlot {
    let grid = linspace(c.scan_range.0, c.scan_range.1, CURVE_GRID);
    CellPlot {
        title: format!("roots of {}", c.scan_function),
        points: c.all_roots.iter().map(|r| (r.root, r.f_root)).collect(),
        curves: vec![Curve {
            label: c.scan_function.clone(),
            points: grid.iter().map(|&x| (x, wavy(x))).collect(),
        }],
    }
}

fn plot_minimize(c: &MinimizeCell) -> CellPlot {
    let grid = linspace(WAVY_RANGE.0, WAVY_RANGE.1, CURVE_GRID);
    CellPlot {
        title: format!("minima of {}", c.function),
        points: vec![(c.global.x, c.global.fx), (c.local.x, c.local.fx)],
        curves: vec![Curve {
            label: c.function.clone(),
            points: grid.iter().map(|&x| (x, wavy(x))).collect(),
        }],
    }
}

fn plot_regression(c: &RegressionCell) -> CellPlot {
    let stats = c.sample.stats();
    let grid = linspace(stats.x_min, stats.x_max, CURVE_GRID);
    CellPlot {
        title: format!("linear regression (r = {:.3})", c.fit.r_value),
        points: c.sample.points(),
        curves: vec![Curve {
            label: "least squares line".to_string(),
            points: grid.iter().map(|&x| (x, c.fit.predict(x))).collect(),
        }],
    }
}

fn plot_goodness(c: &GoodnessCell) -> CellPlot {
    // Empirical CDF against the fitted normal CDF.
    let mut sorted = c.draws.clone();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let points = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| (x, (i as f64 + 0.5) / n))
        .collect();

    let mut curves = Vec::new();
    if let Ok(fitted) = Normal::new(c.fitted_mean, c.fitted_sd) {
        let lo = c.fitted_mean - 4.0 * c.fitted_sd;
        let hi = c.fitted_mean + 4.0 * c.fitted_sd;
        curves.push(Curve {
            label: "fitted normal CDF".to_string(),
            points: linspace(lo, hi, CURVE_GRID)
                .into_iter()
                .map(|x| (x, fitted.cdf(x)))
                .collect(),
        });
    }
    CellPlot {
        title: format!("empirical vs fitted CDF (p = {:.3})", c.test.p_value),
        points,
        curves,
    }
}

fn plot_fit(title: &str, sample: &Sample, fit: &FitResult) -> CellPlot {
    let stats = sample.stats();
    let grid = linspace(stats.x_min, stats.x_max, CURVE_GRID);
    let ys = fitted_grid(&fit.model, &grid);
    CellPlot {
        title: title.to_string(),
        points: sample.points(),
        curves: vec![Curve {
            label: fit.model.display_name.clone(),
            points: grid.into_iter().zip(ys).collect(),
        }],
    }
}

fn plot_interpolation(c: &InterpolationCell) -> CellPlot {
    let zip = |ys: &[f64]| -> Vec<(f64, f64)> { c.grid.iter().copied().zip(ys.iter().copied()).collect() };
    CellPlot {
        title: format!("interpolating {} from {} knots", c.function, c.knots.len()),
        points: c.knots.points(),
        curves: vec![
            Curve {
                label: "natural cubic spline".to_string(),
                points: zip(&c.spline),
            },
            Curve {
                label: "piecewise linear".to_string(),
                points: zip(&c.linear),
            },
        ],
    }
}
