//! Nonlinear least squares (Levenberg–Marquardt).
//!
//! Given a model `f(x, p)`, observations `(x_i, y_i)` with optional
//! uncertainties `σ_i`, and a starting point `p0`, we minimize
//!
//! ```text
//! χ²(p) = Σ ((y_i - f(x_i, p)) / σ_i)^2
//! ```
//!
//! and report the fitted parameters together with their covariance
//! `(JᵀWJ)⁻¹ · χ²/(n - k)`, i.e. uncertainties are taken as relative weights
//! and rescaled by the reduced χ² of the fit.
//!
//! The Jacobian is built with forward differences; models here have at most a
//! handful of parameters, so that costs `k + 1` model sweeps per iteration.
//!
//! Because the objective is non-convex, [`curve_fit_multistart`] runs the fit
//! from several starting points in parallel and keeps the best one.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::math::errors::{NumericError, NumericResult};

/// Damping above which no downhill step exists at the current point.
const LAMBDA_MAX: f64 = 1e12;

#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    pub max_iter: usize,
    /// Relative reduction of χ² below which we stop.
    pub ftol: f64,
    /// Relative step size below which we stop.
    pub xtol: f64,
    /// Initial Marquardt damping.
    pub lambda0: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iter: 200,
            ftol: 1e-12,
            xtol: 1e-10,
            lambda0: 1e-3,
        }
    }
}

/// Output of a nonlinear fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFit {
    pub params: Vec<f64>,
    /// Row-major `k x k` parameter covariance.
    pub covariance: Vec<Vec<f64>>,
    pub stderr: Vec<f64>,
    /// Weighted objective χ².
    pub chi2: f64,
    /// Unweighted sum of squared residuals.
    pub sse: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Fit `f` to `(x, y)` from `p0`.
///
/// `sigma`, when given, holds one positive uncertainty per observation.
pub fn curve_fit<F>(
    f: F,
    x: &[f64],
    y: &[f64],
    sigma: Option<&[f64]>,
    p0: &[f64],
    opts: &LmOptions,
) -> NumericResult<CurveFit>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n = x.len();
    let k = p0.len();
    if y.len() != n {
        return Err(NumericError::LengthMismatch {
            left: n,
            right: y.len(),
        });
    }
    if n <= k {
        return Err(NumericError::TooFewPoints { n, min: k + 1 });
    }
    if x.iter().chain(y).chain(p0).any(|v| !v.is_finite()) {
        return Err(NumericError::NonFinite { x: f64::NAN });
    }
    let sqrt_w: Vec<f64> = match sigma {
        Some(s) => {
            if s.len() != n {
                return Err(NumericError::LengthMismatch {
                    left: n,
                    right: s.len(),
                });
            }
            if s.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(NumericError::NonFinite { x: f64::NAN });
            }
            s.iter().map(|v| 1.0 / v).collect()
        }
        None => vec![1.0; n],
    };

    let mut p = DVector::from_column_slice(p0);
    let mut r = residuals(&f, x, y, &sqrt_w, p.as_slice())?;
    let mut cost = r.norm_squared();
    let mut lambda = opts.lambda0;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < opts.max_iter {
        iterations += 1;
        let j = jacobian(&f, x, &sqrt_w, p.as_slice())?;
        let jt = j.transpose();
        let a = &jt * &j;
        let g = &jt * &r;

        // Inner loop: raise the damping until a step lowers χ².
        let mut stepped = false;
        while lambda <= LAMBDA_MAX {
            let mut damped = a.clone();
            for d in 0..k {
                damped[(d, d)] += lambda * a[(d, d)].max(1e-12);
            }
            let Some(delta) = solve_spd(damped, &g) else {
                lambda *= 10.0;
                continue;
            };
            let p_new = &p + &delta;
            let r_new = match residuals(&f, x, y, &sqrt_w, p_new.as_slice()) {
                Ok(r) => r,
                Err(_) => {
                    lambda *= 10.0;
                    continue;
                }
            };
            let cost_new = r_new.norm_squared();
            if cost_new < cost {
                let small_drop = cost - cost_new <= opts.ftol * cost;
                let small_step = delta.norm() <= opts.xtol * (p.norm() + opts.xtol);
                p = p_new;
                r = r_new;
                cost = cost_new;
                lambda = (lambda / 10.0).max(1e-15);
                stepped = true;
                if small_drop || small_step {
                    converged = true;
                }
                break;
            }
            lambda *= 10.0;
        }

        if !stepped {
            // No downhill direction left: we are at a (local) minimum.
            converged = true;
        }
        if converged || cost == 0.0 {
            converged = true;
            break;
        }
    }

    let j = jacobian(&f, x, &sqrt_w, p.as_slice())?;
    let jtj = j.transpose() * &j;
    let unscaled = jtj.pseudo_inverse(1e-14).map_err(|_| NumericError::Singular)?;
    let scale = cost / (n - k) as f64;
    let cov = unscaled * scale;
    if cov.iter().any(|v| !v.is_finite()) {
        return Err(NumericError::Singular);
    }

    let params: Vec<f64> = p.iter().copied().collect();
    let sse = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let e = yi - f(xi, &params);
            e * e
        })
        .sum();
    let covariance: Vec<Vec<f64>> = (0..k).map(|i| (0..k).map(|c| cov[(i, c)]).collect()).collect();
    let stderr = (0..k).map(|i| cov[(i, i)].max(0.0).sqrt()).collect();

    debug!(iterations, converged, chi2 = cost, "levenberg-marquardt finished");

    Ok(CurveFit {
        params,
        covariance,
        stderr,
        chi2: cost,
        sse,
        iterations,
        converged,
    })
}

/// Run [`curve_fit`] from every start in `starts` (in parallel) and keep the
/// lowest χ². Ties go to the earlier start so results are deterministic.
pub fn curve_fit_multistart<F>(
    f: F,
    x: &[f64],
    y: &[f64],
    sigma: Option<&[f64]>,
    starts: &[Vec<f64>],
    opts: &LmOptions,
) -> Result<CurveFit, AppError>
where
    F: Fn(f64, &[f64]) -> f64 + Sync,
{
    if starts.is_empty() {
        return Err(AppError::invalid_input("No starting points for the nonlinear fit."));
    }

    let candidates: Vec<(usize, CurveFit)> = starts
        .par_iter()
        .enumerate()
        .filter_map(|(idx, p0)| curve_fit(&f, x, y, sigma, p0, opts).ok().map(|fit| (idx, fit)))
        .collect();

    let mut best: Option<&(usize, CurveFit)> = None;
    for c in &candidates {
        best = match best {
            None => Some(c),
            Some(b) if c.1.chi2 < b.1.chi2 || (c.1.chi2 == b.1.chi2 && c.0 < b.0) => Some(c),
            keep => keep,
        };
    }

    let Some((idx, fit)) = best else {
        return Err(AppError::numerical(format!(
            "Nonlinear fit failed from all {} starting points.",
            starts.len()
        )));
    };
    debug!(start = idx, candidates = candidates.len(), chi2 = fit.chi2, "multistart selected");
    Ok(fit.clone())
}

fn residuals<F>(f: &F, x: &[f64], y: &[f64], sqrt_w: &[f64], p: &[f64]) -> NumericResult<DVector<f64>>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let mut r = DVector::<f64>::zeros(x.len());
    for i in 0..x.len() {
        let v = sqrt_w[i] * (y[i] - f(x[i], p));
        if !v.is_finite() {
            return Err(NumericError::NonFinite { x: x[i] });
        }
        r[i] = v;
    }
    Ok(r)
}

/// Weighted Jacobian of the model (not of the residual): `J_ij = √w_i ∂f/∂p_j`.
fn jacobian<F>(f: &F, x: &[f64], sqrt_w: &[f64], p: &[f64]) -> NumericResult<DMatrix<f64>>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n = x.len();
    let k = p.len();
    let base: Vec<f64> = x.iter().map(|&xi| f(xi, p)).collect();
    let mut j = DMatrix::<f64>::zeros(n, k);
    let mut shifted = p.to_vec();
    for c in 0..k {
        let h = f64::EPSILON.sqrt() * p[c].abs().max(1.0);
        shifted[c] = p[c] + h;
        for i in 0..n {
            let d = (f(x[i], &shifted) - base[i]) / h;
            if !d.is_finite() {
                return Err(NumericError::NonFinite { x: x[i] });
            }
            j[(i, c)] = sqrt_w[i] * d;
        }
        shifted[c] = p[c];
    }
    Ok(j)
}

fn solve_spd(a: DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let sol = match a.clone().cholesky() {
        Some(chol) => chol.solve(b),
        None => a.lu().solve(b)?,
    };
    sol.iter().all(|v| v.is_finite()).then_some(sol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;
    use crate::models::predict;

    fn exp_decay(x: f64, p: &[f64]) -> f64 {
        predict(ModelKind::ExpDecay, x, p)
    }

    #[test]
    fn recovers_exact_exponential() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.2).collect();
        let truth = [2.5, 1.3, 0.5];
        let y: Vec<f64> = x.iter().map(|&v| exp_decay(v, &truth)).collect();

        let fit = curve_fit(exp_decay, &x, &y, None, &[1.0, 0.5, 0.0], &LmOptions::default()).unwrap();
        for (a, b) in fit.params.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-6, "{:?}", fit.params);
        }
        assert!(fit.sse < 1e-12);
        assert!(fit.converged);
    }

    #[test]
    fn linear_model_matches_closed_form_covariance() {
        // y = a + b x with noise-like perturbations; compare against OLS formulas.
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.1, 2.9, 5.2, 6.8, 9.1, 11.0];
        let line = |xi: f64, p: &[f64]| p[0] + p[1] * xi;
        let fit = curve_fit(line, &x, &y, None, &[0.0, 0.0], &LmOptions::default()).unwrap();

        let reg = crate::stats::linregress(&x, &y).unwrap();
        assert!((fit.params[0] - reg.intercept).abs() < 1e-6);
        assert!((fit.params[1] - reg.slope).abs() < 1e-6);
        assert!((fit.stderr[1] - reg.stderr).abs() < 1e-6);
        assert!((fit.stderr[0] - reg.intercept_stderr).abs() < 1e-6);
        assert_eq!(fit.covariance.len(), 2);
        assert!((fit.covariance[0][1] - fit.covariance[1][0]).abs() < 1e-12);
    }

    #[test]
    fn sigma_weights_the_objective() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 2.0, 10.0];
        let constant = |_: f64, p: &[f64]| p[0];
        let sigma = [1.0, 1.0, 1.0, 1e3];
        let fit = curve_fit(constant, &x, &y, Some(&sigma), &[0.0], &LmOptions::default()).unwrap();
        // The outlier is almost ignored: weighted mean ~ 1.
        assert!((fit.params[0] - 1.0).abs() < 1e-3, "{:?}", fit.params);
    }

    #[test]
    fn rejects_underdetermined_problem() {
        let err = curve_fit(exp_decay, &[0.0, 1.0, 2.0], &[1.0, 0.5, 0.2], None, &[1.0, 1.0, 0.0], &LmOptions::default())
            .unwrap_err();
        assert_eq!(err, NumericError::TooFewPoints { n: 3, min: 4 });
    }

    #[test]
    fn multistart_prefers_lowest_chi2() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
        let truth = [3.0, 2.0, 0.4];
        let gauss = |xi: f64, p: &[f64]| predict(ModelKind::Gaussian, xi, p);
        let y: Vec<f64> = x.iter().map(|&v| gauss(v, &truth)).collect();

        // A far-off start that stalls plus a sensible one.
        let starts = vec![vec![1.0, 0.1, 0.05], vec![2.5, 1.8, 0.5]];
        let fit = curve_fit_multistart(gauss, &x, &y, None, &starts, &LmOptions::default()).unwrap();
        assert!((fit.params[1] - 2.0).abs() < 1e-5, "{:?}", fit.params);
        assert!(fit.chi2 < 1e-10);
    }
}
