//! Model evaluation for the polynomial / exponential / gaussian families.
//!
//! The fitters rely on three primitive operations:
//! - build a design row for a given x (linear models only, for OLS)
//! - predict y(x) given parameters (for residuals/plots/Jacobians)
//! - propose starting points for the nonlinear fitter
//!
//! These are implemented here for each model kind.

use crate::domain::{ModelKind, Sample};

/// Smallest width accepted for a gaussian; keeps `predict` finite.
const MIN_WIDTH: f64 = 1e-9;

/// Fill a polynomial design row `[1, x, x^2, ..., x^d]`.
///
/// # Panics
/// Panics if `out` is shorter than `degree + 1`.
pub fn fill_design_row(degree: usize, x: f64, out: &mut [f64]) {
    let mut p = 1.0;
    for slot in out.iter_mut().take(degree + 1) {
        *slot = p;
        p *= x;
    }
}

/// Predict `y(x)` for the given model kind.
pub fn predict(model: ModelKind, x: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::Polynomial { degree } => {
            // Horner.
            params[..=degree].iter().rev().fold(0.0, |acc, &c| acc * x + c)
        }
        ModelKind::ExpDecay => params[0] * (-params[1] * x).exp() + params[2],
        ModelKind::Gaussian => {
            let s = params[2].abs().max(MIN_WIDTH);
            let z = (x - params[1]) / s;
            params[0] * (-0.5 * z * z).exp()
        }
    }
}

/// Human-readable formula with parameter values substituted.
pub fn formula(model: ModelKind, params: &[f64]) -> String {
    match model {
        ModelKind::Polynomial { degree } => {
            let mut terms = Vec::with_capacity(degree + 1);
            for (i, c) in params.iter().enumerate().take(degree + 1) {
                terms.push(match i {
                    0 => format!("{c:.4}"),
                    1 => format!("{c:.4}·x"),
                    _ => format!("{c:.4}·x^{i}"),
                });
            }
            format!("y = {}", terms.join(" + "))
        }
        ModelKind::ExpDecay => format!(
            "y = {:.4}·exp(-{:.4}·x) + {:.4}",
            params[0], params[1], params[2]
        ),
        ModelKind::Gaussian => format!(
            "y = {:.4}·exp(-(x - {:.4})² / (2·{:.4}²))",
            params[0], params[1], params[2]
        ),
    }
}

/// Deterministic starting points for the nonlinear fitter.
///
/// The first guess is a data-driven estimate; the rest perturb its nonlinear
/// parameters (rate, centre, width) over a spread of scales.
pub fn initial_guesses(model: ModelKind, sample: &Sample, count: usize) -> Vec<Vec<f64>> {
    let count = count.max(1);
    let stats = sample.stats();
    let span = (stats.x_max - stats.x_min).abs().max(1e-6);

    match model {
        ModelKind::Polynomial { degree } => vec![vec![0.0; degree + 1]],
        ModelKind::ExpDecay => {
            // Level from the right end, amplitude from the left end.
            let (y_left, y_right) = end_values(sample);
            let c0 = y_right;
            let a0 = y_left - y_right;
            let rates = log_spread(1.0 / span, count);
            rates.into_iter().map(|b| vec![a0, b, c0]).collect()
        }
        ModelKind::Gaussian => {
            let (x_peak, y_peak) = peak(sample);
            let widths = log_spread(span / 6.0, count);
            widths.into_iter().map(|s| vec![y_peak, x_peak, s]).collect()
        }
    }
}

/// `count` values log-spaced over a factor of 16 around `center`.
fn log_spread(center: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![center];
    }
    let lo = (center / 4.0).ln();
    let hi = (center * 4.0).ln();
    let step = (hi - lo) / (count as f64 - 1.0);
    // Start with the centre itself so the data-driven guess is always tried first.
    let mut out = vec![center];
    out.extend((0..count - 1).map(|i| (lo + step * i as f64).exp()));
    out
}

fn end_values(sample: &Sample) -> (f64, f64) {
    let mut pairs = sample.points();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let k = (pairs.len() / 10).max(1).min(pairs.len());
    let mean = |s: &[(f64, f64)]| s.iter().map(|p| p.1).sum::<f64>() / s.len().max(1) as f64;
    (mean(&pairs[..k]), mean(&pairs[pairs.len() - k..]))
}

fn peak(sample: &Sample) -> (f64, f64) {
    sample
        .points()
        .into_iter()
        .fold((0.0, f64::NEG_INFINITY), |best, p| if p.1 > best.1 { p } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polynomial_predict_matches_design_row() {
        let params = [1.0, -2.0, 0.5, 0.25];
        let mut row = [0.0; 4];
        for &x in &[-1.5, 0.0, 2.0, 3.3] {
            fill_design_row(3, x, &mut row);
            let dot: f64 = row.iter().zip(&params).map(|(a, b)| a * b).sum();
            let y = predict(ModelKind::Polynomial { degree: 3 }, x, &params);
            assert!((dot - y).abs() < 1e-12);
        }
    }

    #[test]
    fn nonlinear_models_at_reference_points() {
        let y = predict(ModelKind::ExpDecay, 0.0, &[2.0, 1.0, 0.5]);
        assert!((y - 2.5).abs() < 1e-12);
        let y = predict(ModelKind::Gaussian, 1.0, &[3.0, 1.0, 0.2]);
        assert!((y - 3.0).abs() < 1e-12);
        // Zero width stays finite.
        assert!(predict(ModelKind::Gaussian, 1.0, &[3.0, 0.0, 0.0]).is_finite());
    }

    #[test]
    fn initial_guesses_start_from_data_estimate() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|&v| 3.0 * (-1.2 * v).exp() + 0.5).collect();
        let sample = Sample { x, y, sigma: None };
        let guesses = initial_guesses(ModelKind::ExpDecay, &sample, 5);
        assert_eq!(guesses.len(), 5);
        assert!(guesses.iter().all(|g| g.len() == 3 && g[1] > 0.0));
        assert!(guesses[0][0] > 2.0);
    }

    #[test]
    fn formula_mentions_every_coefficient() {
        let f = formula(ModelKind::Polynomial { degree: 2 }, &[1.0, 2.0, 3.0]);
        assert_eq!(f, "y = 1.0000 + 2.0000·x + 3.0000·x^2");
    }
}
