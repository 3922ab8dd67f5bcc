//! Debug bundle writer for inspecting a notebook run.
//!
//! A bundle is a single markdown file with the run configuration, every
//! cell's terminal report, and the raw tables behind the fits (samples, the
//! F-test chain, fitted values of every polynomial degree).

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::{CellOutput, NotebookRun};
use crate::domain::NotebookConfig;
use crate::error::AppError;
use crate::fit::{compute_residuals, fitted_grid};
use crate::report::format_cell;

/// Default bundle directory, relative to the working directory.
pub const DEBUG_DIR: &str = "debug_runs";

pub fn write_debug_bundle(run: &NotebookRun, config: &NotebookConfig) -> Result<PathBuf, AppError> {
    write_debug_bundle_to(Path::new(DEBUG_DIR), run, config)
}

pub fn write_debug_bundle_to(dir: &Path, run: &NotebookRun, config: &NotebookConfig) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::invalid_input(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("nb_debug_seed{}_{}.md", config.sample_seed, ts));

    let file = File::create(&path)
        .map_err(|e| AppError::invalid_input(format!("Failed to create debug file: {e}")))?;
    let mut file = BufWriter::new(file);

    writeln!(file, "# nb debug bundle").map_err(write_err)?;
    writeln!(file, "- generated: {}", Local::now().to_rfc3339()).map_err(write_err)?;
    writeln!(file, "- sample_seed: {}", config.sample_seed).map_err(write_err)?;
    writeln!(file, "- sample_count: {}", config.sample_count).map_err(write_err)?;
    writeln!(file, "- noise: {}", config.noise).map_err(write_err)?;
    writeln!(
        file,
        "- ftest: true_degree={}, max_degree={}, threshold={}",
        config.true_degree, config.max_degree, config.ftest_threshold
    )
    .map_err(write_err)?;
    writeln!(
        file,
        "- curve: shape={:?}, starts={}",
        config.curve_shape, config.curve_starts
    )
    .map_err(write_err)?;
    writeln!(
        file,
        "- scan_steps: {}, interp_knots: {}",
        config.scan_steps, config.interp_knots
    )
    .map_err(write_err)?;

    for cell in &run.cells {
        writeln!(file, "\n## {}", cell.kind().display_name()).map_err(write_err)?;
        writeln!(file, "```text\n{}\n```", format_cell(cell).trim_end()).map_err(write_err)?;
        write_cell_tables(&mut file, cell)?;
    }

    file.flush().map_err(write_err)?;
    Ok(path)
}

fn write_cell_tables<W: Write>(file: &mut W, cell: &CellOutput) -> Result<(), AppError> {
    match cell {
        CellOutput::Ftest(c) => {
            writeln!(file, "\n### F-test chain").map_err(write_err)?;
            writeln!(file, "| simple | rich | dof_simple | dof_rich | n | F | CL | decision |")
                .map_err(write_err)?;
            writeln!(file, "| - | - | - | - | - | - | - | - |").map_err(write_err)?;
            for s in &c.selection.steps {
                writeln!(
                    file,
                    "| {} | {} | {} | {} | {} | {:.6} | {:.6} | {} |",
                    s.simple.display_name(),
                    s.rich.display_name(),
                    s.dof_simple,
                    s.dof_rich,
                    s.n_observations,
                    s.outcome.f_stat,
                    s.outcome.confidence_level,
                    s.outcome.decision.label()
                )
                .map_err(write_err)?;
            }

            writeln!(file, "\n### Fitted values by degree").map_err(write_err)?;
            let header: Vec<String> = c.selection.fits.iter().map(|f| f.model.display_name.clone()).collect();
            writeln!(file, "| x | y_obs | {} |", header.join(" | ")).map_err(write_err)?;
            writeln!(file, "| - | - |{}", " - |".repeat(header.len())).map_err(write_err)?;
            let columns: Vec<Vec<f64>> = c
                .selection
                .fits
                .iter()
                .map(|f| fitted_grid(&f.model, &c.sample.x))
                .collect();
            for (i, (&x, &y)) in c.sample.x.iter().zip(&c.sample.y).enumerate() {
                let row: Vec<String> = columns.iter().map(|col| format!("{:.4}", col[i])).collect();
                writeln!(file, "| {x:.4} | {y:.4} | {} |", row.join(" | ")).map_err(write_err)?;
            }
        }
        CellOutput::CurveFit(c) => {
            writeln!(file, "\n### Sample and residuals").map_err(write_err)?;
            writeln!(file, "| x | y_obs | sigma | y_fit | residual |").map_err(write_err)?;
            writeln!(file, "| - | - | - | - | - |").map_err(write_err)?;
            let sigma = c.sample.sigma.as_deref().unwrap_or(&[]);
            for (i, r) in compute_residuals(&c.fit.model, &c.sample).iter().enumerate() {
                writeln!(
                    file,
                    "| {:.4} | {:.4} | {} | {:.4} | {:+.4} |",
                    r.x,
                    r.y_obs,
                    fmt_opt(sigma.get(i).copied()),
                    r.y_fit,
                    r.residual
                )
                .map_err(write_err)?;
            }
        }
        CellOutput::Regression(c) => {
            writeln!(file, "\n### Sample").map_err(write_err)?;
            writeln!(file, "| x | y | y_fit |").map_err(write_err)?;
            writeln!(file, "| - | - | - |").map_err(write_err)?;
            for (&x, &y) in c.sample.x.iter().zip(&c.sample.y) {
                writeln!(file, "| {x:.4} | {y:.4} | {:.4} |", c.fit.predict(x)).map_err(write_err)?;
            }
        }
        CellOutput::Roots(_) | CellOutput::Minimize(_) | CellOutput::Goodness(_) | CellOutput::Interpolation(_) => {}
    }
    Ok(())
}

fn write_err(e: std::io::Error) -> AppError {
    AppError::invalid_input(format!("Failed to write debug bundle: {e}"))
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_notebook;
    use crate::domain::CellKind;

    #[test]
    fn bundle_contains_every_cell_and_the_chain() {
        let config = NotebookConfig {
            cells: vec![CellKind::Regression, CellKind::CurveFit, CellKind::Ftest],
            ..NotebookConfig::default()
        };
        let run = run_notebook(&config).unwrap();

        let dir = std::env::temp_dir().join(format!("nb-debug-{}", std::process::id()));
        let path = write_debug_bundle_to(&dir, &run, &config).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert!(text.starts_with("# nb debug bundle"));
        assert!(text.contains("## Linear regression"));
        assert!(text.contains("## Curve fitting"));
        assert!(text.contains("### F-test chain"));
        assert!(text.contains("### Fitted values by degree"));
    }
}
