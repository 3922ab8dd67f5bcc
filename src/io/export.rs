//! Export a whole notebook run to JSON.
//!
//! The export is meant to be easy to consume from scripts: every cell carries
//! its inputs (samples) and outputs, tagged by `"cell"`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::app::pipeline::NotebookRun;
use crate::error::AppError;

/// Write a run to a pretty-printed JSON file.
pub fn write_results_json(path: &Path, run: &NotebookRun) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::invalid_input(format!("Failed to create export JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(BufWriter::new(file), run)
        .map_err(|e| AppError::invalid_input(format!("Failed to write export JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_notebook;
    use crate::domain::{CellKind, NotebookConfig};

    #[test]
    fn export_is_tagged_by_cell() {
        let config = NotebookConfig {
            cells: vec![CellKind::Regression, CellKind::Ftest],
            ..NotebookConfig::default()
        };
        let run = run_notebook(&config).unwrap();

        let path = std::env::temp_dir().join(format!("nb-export-{}.json", std::process::id()));
        write_results_json(&path, &run).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["seed"], 42);
        assert_eq!(value["cells"][0]["cell"], "regression");
        assert_eq!(value["cells"][1]["cell"], "ftest");
        assert!(value["cells"][1]["selection"]["steps"].is_array());
    }

    #[test]
    fn unwritable_path_is_invalid_input() {
        let run = NotebookRun {
            seed: 1,
            sample_count: 0,
            noise: 0.0,
            cells: vec![],
        };
        let err = write_results_json(Path::new("/nonexistent-dir/x/run.json"), &run).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
