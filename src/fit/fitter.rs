//! Fitting routines for a single model kind.
//!
//! Polynomials are linear in their coefficients and go through a (weighted)
//! SVD least-squares solve. Exponential decay and gaussian shapes go through
//! Levenberg–Marquardt, started from several data-driven guesses in parallel.
//!
//! Both paths return a [`FitResult`] with parameter uncertainties taken from the
//! scaled covariance `(XᵀWX)⁻¹ · χ²/(n - k)`.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitQuality, FitResult, FittedModel, ModelKind, PointResidual, Sample};
use crate::error::AppError;
use crate::fit::lsq::{curve_fit_multistart, CurveFit, LmOptions};
use crate::math::{normal_inverse, solve_least_squares};
use crate::models::{fill_design_row, initial_guesses, predict};

/// Fit `c0 + c1 x + ... + c_d x^d` by least squares.
///
/// Per-point `sigma` (if present) weights each row by `1/σ_i`.
pub fn fit_polynomial(sample: &Sample, degree: usize) -> Result<FitResult, AppError> {
    let model = ModelKind::Polynomial { degree };
    let n = sample.len();
    let k = model.param_count();
    validate_sample(sample)?;
    if n <= k {
        return Err(AppError::insufficient_data(format!(
            "Cannot fit {} ({k} parameters) to {n} points.",
            model.display_name()
        )));
    }

    let sqrt_w = sqrt_weights(sample)?;
    let mut x_mat = DMatrix::<f64>::zeros(n, k);
    let mut y_vec = DVector::<f64>::zeros(n);
    let mut row = vec![0.0; k];
    for i in 0..n {
        fill_design_row(degree, sample.x[i], &mut row);
        for (j, &v) in row.iter().enumerate() {
            x_mat[(i, j)] = sqrt_w[i] * v;
        }
        y_vec[i] = sqrt_w[i] * sample.y[i];
    }

    let Some(beta) = solve_least_squares(&x_mat, &y_vec) else {
        return Err(AppError::numerical(format!(
            "Least-squares solve failed for {}.",
            model.display_name()
        )));
    };

    let chi2 = (&y_vec - &x_mat * &beta).norm_squared();
    let cov = normal_inverse(&x_mat)? * (chi2 / (n - k) as f64);
    let stderr = (0..k).map(|i| cov[(i, i)].max(0.0).sqrt()).collect();

    Ok(to_fit_result(model, beta.iter().copied().collect(), stderr, sample))
}

/// Fit a nonlinear model from `starts` starting points and keep the best.
///
/// Returns the domain-level result together with the raw solver output
/// (covariance, iteration count, convergence flag).
pub fn fit_nonlinear(
    model: ModelKind,
    sample: &Sample,
    starts: usize,
    opts: &LmOptions,
) -> Result<(FitResult, CurveFit), AppError> {
    validate_sample(sample)?;
    let k = model.param_count();
    if sample.len() <= k {
        return Err(AppError::insufficient_data(format!(
            "Cannot fit {} ({k} parameters) to {} points.",
            model.display_name(),
            sample.len()
        )));
    }

    let guesses = initial_guesses(model, sample, starts);
    let fit = curve_fit_multistart(
        |x, p| predict(model, x, p),
        &sample.x,
        &sample.y,
        sample.sigma.as_deref(),
        &guesses,
        opts,
    )?;

    let mut params = fit.params.clone();
    if model == ModelKind::Gaussian {
        // Width enters squared; report it positive.
        params[2] = params[2].abs();
    }
    let result = to_fit_result(model, params, fit.stderr.clone(), sample);
    Ok((result, fit))
}

/// Per-point observed vs fitted values.
pub fn compute_residuals(model: &FittedModel, sample: &Sample) -> Vec<PointResidual> {
    sample
        .x
        .iter()
        .zip(&sample.y)
        .map(|(&x, &y_obs)| {
            let y_fit = predict(model.kind, x, &model.params);
            PointResidual {
                x,
                y_obs,
                y_fit,
                residual: y_obs - y_fit,
            }
        })
        .collect()
}

/// Fitted values of `model` on an x-grid.
pub fn fitted_grid(model: &FittedModel, xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| predict(model.kind, x, &model.params)).collect()
}

/// BIC = n ln(SSE/n) + k ln(n), with SSE floored to keep the log finite.
pub fn bic(n: usize, sse: f64, k: usize) -> f64 {
    let n_f = n as f64;
    let sse_per = (sse / n_f).max(1e-12);
    n_f * sse_per.ln() + (k as f64) * n_f.ln()
}

fn to_fit_result(kind: ModelKind, params: Vec<f64>, stderr: Vec<f64>, sample: &Sample) -> FitResult {
    let n = sample.len();
    let model = FittedModel {
        kind,
        display_name: kind.display_name(),
        params,
        stderr,
    };
    let sse: f64 = compute_residuals(&model, sample)
        .iter()
        .map(|r| r.residual * r.residual)
        .sum();
    let rmse = (sse / n as f64).sqrt();
    FitResult {
        model,
        quality: FitQuality {
            sse,
            rmse,
            bic: bic(n, sse, kind.param_count()),
            n,
        },
    }
}

fn validate_sample(sample: &Sample) -> Result<(), AppError> {
    if sample.is_empty() {
        return Err(AppError::insufficient_data("No data points to fit."));
    }
    if sample.x.len() != sample.y.len() {
        return Err(AppError::invalid_input(format!(
            "x and y lengths differ ({} vs {}).",
            sample.x.len(),
            sample.y.len()
        )));
    }
    if sample.x.iter().chain(&sample.y).any(|v| !v.is_finite()) {
        return Err(AppError::invalid_input("Sample contains non-finite values."));
    }
    Ok(())
}

fn sqrt_weights(sample: &Sample) -> Result<Vec<f64>, AppError> {
    match &sample.sigma {
        None => Ok(vec![1.0; sample.len()]),
        Some(s) if s.len() != sample.len() => Err(AppError::invalid_input(format!(
            "sigma has {} entries for {} points.",
            s.len(),
            sample.len()
        ))),
        Some(s) => s
            .iter()
            .map(|&v| {
                if v.is_finite() && v > 0.0 {
                    Ok(1.0 / v)
                } else {
                    Err(AppError::invalid_input(format!("Invalid sigma value {v}.")))
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic_sample() -> Sample {
        let x: Vec<f64> = (0..25).map(|i| -2.0 + i as f64 * 0.2).collect();
        let y = x.iter().map(|&v| 1.0 - 0.5 * v + 2.0 * v * v).collect();
        Sample { x, y, sigma: None }
    }

    #[test]
    fn polynomial_fit_recovers_coefficients() {
        let fit = fit_polynomial(&quadratic_sample(), 2).unwrap();
        let expected = [1.0, -0.5, 2.0];
        for (a, b) in fit.model.params.iter().zip(expected) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(fit.quality.sse < 1e-18);
        assert_eq!(fit.model.display_name, "quadratic");
    }

    #[test]
    fn richer_polynomial_never_increases_sse() {
        let mut sample = quadratic_sample();
        for (i, y) in sample.y.iter_mut().enumerate() {
            *y += if i % 2 == 0 { 0.3 } else { -0.2 };
        }
        let sse: Vec<f64> = (0..5)
            .map(|d| fit_polynomial(&sample, d).unwrap().quality.sse)
            .collect();
        for w in sse.windows(2) {
            assert!(w[1] <= w[0] + 1e-9, "{sse:?}");
        }
    }

    #[test]
    fn polynomial_stderr_matches_line_regression() {
        let x = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![1.1, 2.9, 5.2, 6.8, 9.1, 11.0];
        let sample = Sample {
            x: x.clone(),
            y: y.clone(),
            sigma: None,
        };
        let fit = fit_polynomial(&sample, 1).unwrap();
        let reg = crate::stats::linregress(&x, &y).unwrap();
        assert!((fit.model.params[1] - reg.slope).abs() < 1e-10);
        assert!((fit.model.stderr[1] - reg.stderr).abs() < 1e-10);
    }

    #[test]
    fn underdetermined_polynomial_is_insufficient_data() {
        let sample = Sample {
            x: vec![0.0, 1.0, 2.0],
            y: vec![1.0, 2.0, 0.0],
            sigma: None,
        };
        let err = fit_polynomial(&sample, 2).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn bad_sigma_is_rejected() {
        let mut sample = quadratic_sample();
        sample.sigma = Some(vec![0.0; sample.len()]);
        assert_eq!(fit_polynomial(&sample, 1).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn nonlinear_fit_recovers_exp_decay() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
        let truth = [3.0, 1.5, 0.25];
        let y = x.iter().map(|&v| predict(ModelKind::ExpDecay, v, &truth)).collect();
        let sample = Sample { x, y, sigma: None };

        let (fit, raw) = fit_nonlinear(ModelKind::ExpDecay, &sample, 6, &LmOptions::default()).unwrap();
        for (a, b) in fit.model.params.iter().zip(truth) {
            assert!((a - b).abs() < 1e-6, "{:?}", fit.model.params);
        }
        assert_eq!(raw.covariance.len(), 3);
        assert!(fit.quality.rmse < 1e-8);
    }

    #[test]
    fn bic_penalizes_parameters() {
        assert!(bic(50, 10.0, 3) > bic(50, 10.0, 2));
        assert!(bic(50, 0.0, 2).is_finite());
    }
}
