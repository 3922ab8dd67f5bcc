//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fitted curve:
//! - model kind + parameters (with standard errors)
//! - which cell produced it and when
//! - a precomputed fitted grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;

use crate::data::linspace;
use crate::domain::{CellKind, CurveFile, CurveGrid, FitResult, Sample};
use crate::error::AppError;
use crate::fit::fitted_grid;

/// Points in the saved grid.
const GRID_POINTS: usize = 101;

/// Build the curve file for `fit` over the x-range of `sample`.
pub fn curve_file(cell: CellKind, fit: &FitResult, sample: &Sample) -> CurveFile {
    let stats = sample.stats();
    let (mut x0, mut x1) = (stats.x_min, stats.x_max);
    if !(x0.is_finite() && x1.is_finite()) || x1 <= x0 {
        x0 = 0.0;
        x1 = 1.0;
    }
    let x = linspace(x0, x1, GRID_POINTS);
    let y = fitted_grid(&fit.model, &x);

    CurveFile {
        tool: "nb".to_string(),
        generated_at: Utc::now(),
        cell,
        model: fit.model.clone(),
        fit_quality: fit.quality.clone(),
        grid: CurveGrid { x, y },
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::invalid_input(format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, curve)
        .map_err(|e| AppError::invalid_input(format!("Failed to write curve JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::invalid_input(format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::invalid_input(format!("Invalid curve JSON: {e}")))?;
    if curve.grid.x.len() != curve.grid.y.len() {
        return Err(AppError::invalid_input(format!(
            "Curve grid has {} x values but {} y values.",
            curve.grid.x.len(),
            curve.grid.y.len()
        )));
    }
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::fit_polynomial;

    #[test]
    fn curve_file_survives_a_disk_trip() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = x.iter().map(|&v| 1.0 + 2.0 * v).collect();
        let sample = Sample { x, y, sigma: None };
        let fit = fit_polynomial(&sample, 1).unwrap();
        let curve = curve_file(CellKind::Ftest, &fit, &sample);
        assert_eq!(curve.grid.x.len(), GRID_POINTS);
        assert!((curve.grid.y[GRID_POINTS - 1] - 19.0).abs() < 1e-9);

        let path = std::env::temp_dir().join(format!("nb-curve-{}.json", std::process::id()));
        write_curve_json(&path, &curve).unwrap();
        let back = read_curve_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back.cell, CellKind::Ftest);
        assert_eq!(back.model.kind, fit.model.kind);
        assert_eq!(back.grid.y.len(), GRID_POINTS);
    }

    #[test]
    fn written_file_is_complete_json() {
        let sample = Sample { x: vec![0.0, 1.0, 2.0], y: vec![1.0, 3.0, 5.0], sigma: None };
        let fit = fit_polynomial(&sample, 1).unwrap();
        let curve = curve_file(CellKind::Ftest, &fit, &sample);
        let path = std::env::temp_dir().join(format!("nb-curve-full-{}.json", std::process::id()));
        write_curve_json(&path, &curve).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(text.trim_end().ends_with('}'));
        assert!(serde_json::from_str::<CurveFile>(&text).is_ok());
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = read_curve_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
