//! Command-line parsing for the numerical notebook.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{CellKind, CurveShape};
use crate::stats::DEFAULT_THRESHOLD;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "nb", version, about = "Numerical notebook: roots, minima, regression, fits, F-tests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run notebook cells, print summaries and plots, and optionally export.
    Run(RunArgs),
    /// Compare two nested fits directly from their SSR and degrees of freedom.
    Ftest(FTestArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same pipeline as `nb run`, but renders each cell in a
    /// terminal UI using Ratatui.
    Tui(NotebookArgs),
}

/// Options shared by `run` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct NotebookArgs {
    /// Random seed for the synthetic samples.
    #[arg(long, env = "NB_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic observations per cell.
    #[arg(short = 'n', long = "samples", env = "NB_SAMPLES", default_value_t = 60)]
    pub sample_count: usize,

    /// Noise standard deviation for the synthetic samples.
    #[arg(long, default_value_t = 0.5)]
    pub noise: f64,

    /// Highest polynomial degree tried by the F-test chain.
    #[arg(long, default_value_t = 5)]
    pub max_degree: usize,

    /// Polynomial degree used to generate the F-test sample.
    #[arg(long, default_value_t = 2)]
    pub true_degree: usize,

    /// Confidence level below which an extra parameter is justified.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Shape fitted by the curve-fit cell.
    #[arg(long, value_enum, default_value_t = CurveShape::ExpDecay)]
    pub shape: CurveShape,

    /// Starting points for the nonlinear fit (run in parallel).
    #[arg(long, default_value_t = 8)]
    pub starts: usize,

    /// Grid cells for root and minimum scans.
    #[arg(long, default_value_t = 200)]
    pub scan_steps: usize,

    /// Knots for the interpolation cell.
    #[arg(long, default_value_t = 9)]
    pub knots: usize,
}

/// Options for `nb run`.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub notebook: NotebookArgs,

    /// Cells to run (repeatable); all cells when omitted.
    #[arg(short = 'c', long = "cell", value_enum)]
    pub cells: Vec<CellKind>,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the whole run to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fitted curve (model + params + grid) to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,

    /// Write a markdown debug bundle to `debug_runs/`.
    #[arg(long)]
    pub debug: bool,
}

/// Options for `nb ftest`.
#[derive(Debug, Args, Clone)]
pub struct FTestArgs {
    /// Residual sum of squares of the simpler model.
    #[arg(long)]
    pub ssr_simple: f64,

    /// Residual sum of squares of the richer model.
    #[arg(long)]
    pub ssr_rich: f64,

    /// Degrees of freedom (parameter count - 1) of the simpler model.
    #[arg(long)]
    pub dof_simple: usize,

    /// Degrees of freedom (parameter count - 1) of the richer model.
    #[arg(long)]
    pub dof_rich: usize,

    /// Number of observations both models were fitted to.
    #[arg(short = 'n', long = "observations")]
    pub n_observations: usize,

    /// Confidence level below which the extra parameters are justified.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Print the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Options for plotting a saved curve.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Curve JSON file produced by `nb run --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_accepts_repeated_cells() {
        let cli = Cli::parse_from(["nb", "run", "--cell", "ftest", "-c", "curve-fit", "--seed", "7"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.cells, vec![CellKind::Ftest, CellKind::CurveFit]);
        assert_eq!(args.notebook.seed, 7);
        assert_eq!(args.notebook.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn ftest_takes_five_numbers() {
        let cli = Cli::parse_from([
            "nb", "ftest", "--ssr-simple", "10", "--ssr-rich", "5", "--dof-simple", "1", "--dof-rich", "2", "-n", "51",
        ]);
        let Command::Ftest(args) = cli.command else {
            panic!("expected ftest");
        };
        assert_eq!(args.n_observations, 51);
        assert_eq!(args.dof_rich, 2);
        assert!(!args.json);
    }
}
