//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A notebook cell: one self-contained demonstration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CellKind {
    Roots,
    Minimize,
    Regression,
    Goodness,
    CurveFit,
    Interpolation,
    Ftest,
}

impl CellKind {
    pub const ALL: [CellKind; 7] = [
        CellKind::Roots,
        CellKind::Minimize,
        CellKind::Regression,
        CellKind::Goodness,
        CellKind::CurveFit,
        CellKind::Interpolation,
        CellKind::Ftest,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            CellKind::Roots => "Root finding",
            CellKind::Minimize => "Scalar minimization",
            CellKind::Regression => "Linear regression",
            CellKind::Goodness => "Goodness of fit",
            CellKind::CurveFit => "Curve fitting",
            CellKind::Interpolation => "Interpolation",
            CellKind::Ftest => "F-test model selection",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Nonlinear shapes available to the curve-fitting cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CurveShape {
    /// `a * exp(-b * x) + c`
    ExpDecay,
    /// `a * exp(-(x - mu)^2 / (2 s^2))`
    Gaussian,
}

impl CurveShape {
    pub fn model_kind(self) -> ModelKind {
        match self {
            CurveShape::ExpDecay => ModelKind::ExpDecay,
            CurveShape::Gaussian => ModelKind::Gaussian,
        }
    }
}

/// Concrete parametric model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModelKind {
    /// `p0 + p1 x + ... + p_d x^d`
    Polynomial { degree: usize },
    ExpDecay,
    Gaussian,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> String {
        match self {
            ModelKind::Polynomial { degree: 0 } => "constant".to_string(),
            ModelKind::Polynomial { degree: 1 } => "line".to_string(),
            ModelKind::Polynomial { degree: 2 } => "quadratic".to_string(),
            ModelKind::Polynomial { degree: 3 } => "cubic".to_string(),
            ModelKind::Polynomial { degree } => format!("poly(deg={degree})"),
            ModelKind::ExpDecay => "exp decay".to_string(),
            ModelKind::Gaussian => "gaussian".to_string(),
        }
    }

    /// Number of free parameters.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Polynomial { degree } => degree + 1,
            ModelKind::ExpDecay | ModelKind::Gaussian => 3,
        }
    }

    /// Degrees of freedom as used by the nested-model F-test: `param_count - 1`.
    pub fn dof(self) -> usize {
        self.param_count() - 1
    }

    /// Parameter names, in the order `predict` expects them.
    pub fn param_names(self) -> Vec<String> {
        match self {
            ModelKind::Polynomial { degree } => (0..=degree).map(|i| format!("c{i}")).collect(),
            ModelKind::ExpDecay => vec!["a".into(), "b".into(), "c".into()],
            ModelKind::Gaussian => vec!["a".into(), "mu".into(), "s".into()],
        }
    }

    /// `true` when the model is linear in its parameters.
    pub fn is_linear(self) -> bool {
        matches!(self, ModelKind::Polynomial { .. })
    }
}

/// Observed `(x, y)` pairs with optional per-point uncertainties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub sigma: Option<Vec<f64>>,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }

    pub fn stats(&self) -> DatasetStats {
        let mut stats = DatasetStats {
            n_points: self.len(),
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for (&x, &y) in self.x.iter().zip(&self.y) {
            stats.x_min = stats.x_min.min(x);
            stats.x_max = stats.x_max.max(x);
            stats.y_min = stats.y_min.min(y);
            stats.y_max = stats.y_max.max(y);
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// A per-point fitted result (used for plots and exports).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointResidual {
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    pub residual: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    /// Sum of squared (unweighted) residuals.
    pub sse: f64,
    pub rmse: f64,
    pub bic: f64,
    pub n: usize,
}

/// Fitted model parameters and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    pub kind: ModelKind,
    pub display_name: String,
    pub params: Vec<f64>,
    /// One-sigma parameter uncertainties (sqrt of the covariance diagonal).
    pub stderr: Vec<f64>,
}

/// Fit output for a single model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: FittedModel,
    pub quality: FitQuality,
}

/// A labelled line drawn over the scatter points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Everything a renderer needs to draw one cell: scatter points plus curves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellPlot {
    pub title: String,
    pub points: Vec<(f64, f64)>,
    pub curves: Vec<Curve>,
}

impl CellPlot {
    /// Data bounds over points and curves, ignoring non-finite values.
    ///
    /// Returns `None` when there is nothing finite to draw.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut b = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        let all = self
            .points
            .iter()
            .chain(self.curves.iter().flat_map(|c| c.points.iter()));
        for &(x, y) in all {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            b.0 = b.0.min(x);
            b.1 = b.1.max(x);
            b.2 = b.2.min(y);
            b.3 = b.3.max(y);
        }
        b.0.is_finite().then_some(b)
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct NotebookConfig {
    pub cells: Vec<CellKind>,
    pub sample_seed: u64,
    pub sample_count: usize,
    /// Noise standard deviation for the synthetic samples.
    pub noise: f64,

    /// Highest polynomial degree tried by the F-test chain.
    pub max_degree: usize,
    /// True polynomial degree used to generate the F-test sample.
    pub true_degree: usize,
    /// Confidence-level threshold for the F-test decision.
    pub ftest_threshold: f64,

    pub curve_shape: CurveShape,
    /// Parallel multi-start count for the nonlinear fit.
    pub curve_starts: usize,

    /// Grid cells used when scanning for roots/minima.
    pub scan_steps: usize,
    /// Number of coarse knots for the interpolation cell.
    pub interp_knots: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
    pub debug_bundle: bool,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            cells: CellKind::ALL.to_vec(),
            sample_seed: 42,
            sample_count: 60,
            noise: 0.5,
            max_degree: 5,
            true_degree: 2,
            ftest_threshold: crate::stats::DEFAULT_THRESHOLD,
            curve_shape: CurveShape::ExpDecay,
            curve_starts: 8,
            scan_steps: 200,
            interp_knots: 9,
            plot: true,
            plot_width: 80,
            plot_height: 20,
            export_results: None,
            export_curve: None,
            debug_bundle: false,
        }
    }
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub cell: CellKind,
    pub model: FittedModel,
    pub fit_quality: FitQuality,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}
