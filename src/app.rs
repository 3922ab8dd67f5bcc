//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - runs the requested notebook cells
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FTestArgs, NotebookArgs, PlotArgs, RunArgs};
use crate::domain::{CellKind, NotebookConfig};
use crate::error::AppError;
use crate::stats::FTest;

pub mod pipeline;

/// Entry point for the `nb` binary.
pub fn run() -> Result<(), AppError> {
    // Optional: NB_SEED / NB_SAMPLES / RUST_LOG from a local .env.
    let _ = dotenvy::dotenv();

    // We want `nb` and `nb --seed 7` to behave like `nb tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The TUI owns the terminal; log lines would tear the alternate screen.
    if !matches!(cli.command, Command::Tui(_)) {
        init_tracing();
    }

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Ftest(args) => handle_ftest(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_notebook(&config)?;

    if config.plot {
        println!("{}", crate::report::format_run_header(&run));
        for cell in &run.cells {
            println!("{}", crate::report::format_cell(cell));
            let plot = crate::plot::render_ascii_plot(&cell.plot(), config.plot_width, config.plot_height);
            println!("{plot}");
        }
    } else {
        println!("{}", crate::report::format_run_summary(&run));
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_json(path, &run)?;
        tracing::info!(path = %path.display(), "wrote results JSON");
    }
    if let Some(path) = &config.export_curve {
        let Some((cell, fit, sample)) = run.exported_fit() else {
            return Err(AppError::invalid_input(
                "--export-curve needs the ftest or curve-fit cell in the run.",
            ));
        };
        let curve = crate::io::curve::curve_file(cell, fit, sample);
        crate::io::curve::write_curve_json(path, &curve)?;
        tracing::info!(path = %path.display(), cell = ?cell, "wrote curve JSON");
    }
    if config.debug_bundle {
        let path = crate::debug::write_debug_bundle(&run, &config)?;
        println!("Debug bundle: {}", path.display());
    }

    Ok(())
}

fn handle_ftest(args: FTestArgs) -> Result<(), AppError> {
    let test = FTest::with_threshold(args.threshold)?;
    let outcome = test.compare(
        args.ssr_simple,
        args.ssr_rich,
        args.dof_simple,
        args.dof_rich,
        args.n_observations,
    )?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| AppError::invalid_input(format!("Failed to serialize outcome: {e}")))?;
        println!("{json}");
    } else {
        print!(
            "{}",
            crate::report::format_ftest_outcome(
                args.ssr_simple,
                args.ssr_rich,
                args.dof_simple,
                args.dof_rich,
                args.n_observations,
                test.threshold(),
                &outcome,
            )
        );
    }
    Ok(())
}

fn handle_tui(args: NotebookArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

/// Notebook settings shared by `run` and `tui`. Output options keep their defaults.
pub fn config_from_args(args: &NotebookArgs) -> NotebookConfig {
    NotebookConfig {
        cells: CellKind::ALL.to_vec(),
        sample_seed: args.seed,
        sample_count: args.sample_count,
        noise: args.noise,
        max_degree: args.max_degree,
        true_degree: args.true_degree,
        ftest_threshold: args.threshold,
        curve_shape: args.shape,
        curve_starts: args.starts,
        scan_steps: args.scan_steps,
        interp_knots: args.knots,
        ..NotebookConfig::default()
    }
}

fn run_config_from_args(args: &RunArgs) -> NotebookConfig {
    let mut config = config_from_args(&args.notebook);
    if !args.cells.is_empty() {
        config.cells = args.cells.clone();
    }
    config.plot = !args.no_plot;
    config.plot_width = args.width;
    config.plot_height = args.height;
    config.export_results = args.export.clone();
    config.export_curve = args.export_curve.clone();
    config.debug_bundle = args.debug;
    config
}

/// Rewrite argv so `nb` defaults to `nb tui`.
///
/// Rules:
/// - `nb`                      -> `nb tui`
/// - `nb --seed 7 ...`         -> `nb tui --seed 7 ...`
/// - `nb --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "ftest" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_tui() {
        assert_eq!(rewrite_args(argv(&["nb"])), argv(&["nb", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["nb", "--seed", "7"])),
            argv(&["nb", "tui", "--seed", "7"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        let cases: [&[&str]; 4] = [&["nb", "run"], &["nb", "ftest", "--json"], &["nb", "--help"], &["nb", "-V"]];
        for args in cases {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn run_flags_reach_the_config() {
        let cli = Cli::parse_from([
            "nb", "run", "--seed", "9", "-n", "40", "--max-degree", "4", "-c", "ftest", "--no-plot", "--debug",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = run_config_from_args(&args);
        assert_eq!(config.sample_seed, 9);
        assert_eq!(config.sample_count, 40);
        assert_eq!(config.max_degree, 4);
        assert_eq!(config.cells, vec![CellKind::Ftest]);
        assert!(!config.plot);
        assert!(config.debug_bundle);
    }

    #[test]
    fn no_cell_flag_means_every_cell() {
        let cli = Cli::parse_from(["nb", "run"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(run_config_from_args(&args).cells, CellKind::ALL.to_vec());
    }
}
