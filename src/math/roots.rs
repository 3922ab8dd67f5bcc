//! Scalar root finding.
//!
//! - [`bisect`]: robust, linear convergence, needs a sign-changing bracket.
//! - [`brent_root`]: bracketed inverse-quadratic interpolation with bisection
//!   fallback (the usual default).
//! - [`newton`]: quadratic convergence from a good starting point, needs `f'`.
//! - [`find_roots`]: scans an interval for sign changes and refines each one.

use serde::{Deserialize, Serialize};

use crate::math::errors::{NumericError, NumericResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootResult {
    pub root: f64,
    pub f_root: f64,
    pub iterations: usize,
}

pub fn bisect<F>(f: F, a: f64, b: f64, tol: f64, max_iter: usize) -> NumericResult<RootResult>
where
    F: Fn(f64) -> f64,
{
    check_bracket(a, b)?;
    let (mut lo, mut hi) = (a, b);
    let mut f_lo = eval(&f, lo)?;
    let f_hi = eval(&f, hi)?;
    if let Some(done) = endpoint_root(lo, f_lo, hi, f_hi) {
        return Ok(done);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(NumericError::NoSignChange { fa: f_lo, fb: f_hi });
    }

    for iter in 1..=max_iter {
        let mid = 0.5 * (lo + hi);
        let f_mid = eval(&f, mid)?;
        if f_mid == 0.0 || 0.5 * (hi - lo) < tol {
            return Ok(RootResult {
                root: mid,
                f_root: f_mid,
                iterations: iter,
            });
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(NumericError::MaxIterations {
        iterations: max_iter,
    })
}

/// Brent's method on a sign-changing bracket `[a, b]`.
pub fn brent_root<F>(f: F, a: f64, b: f64, tol: f64, max_iter: usize) -> NumericResult<RootResult>
where
    F: Fn(f64) -> f64,
{
    check_bracket(a, b)?;
    let (mut a, mut b) = (a, b);
    let mut fa = eval(&f, a)?;
    let mut fb = eval(&f, b)?;
    if let Some(done) = endpoint_root(a, fa, b, fb) {
        return Ok(done);
    }
    if fa.signum() == fb.signum() {
        return Err(NumericError::NoSignChange { fa, fb });
    }

    // `b` is the current best estimate, `c` the contrapoint (f(b), f(c) differ in sign).
    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iter in 1..=max_iter {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(RootResult {
                root: b,
                f_root: fb,
                iterations: iter,
            });
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // Secant step.
                (2.0 * xm * s, 1.0 - s)
            } else {
                // Inverse quadratic interpolation.
                let qq = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * qq * (qq - r) - (b - a) * (r - 1.0)),
                    (qq - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        if d.abs() > tol1 {
            b += d;
        } else {
            b += tol1.copysign(xm);
        }
        fb = eval(&f, b)?;
    }

    Err(NumericError::MaxIterations {
        iterations: max_iter,
    })
}

/// Newton–Raphson iteration from `x0`.
pub fn newton<F, D>(f: F, df: D, x0: f64, tol: f64, max_iter: usize) -> NumericResult<RootResult>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut x = x0;
    for iter in 1..=max_iter {
        let fx = eval(&f, x)?;
        let dfx = eval(&df, x)?;
        if dfx == 0.0 {
            return Err(NumericError::ZeroDerivative { x });
        }
        let step = fx / dfx;
        x -= step;
        if !x.is_finite() {
            return Err(NumericError::NonFinite { x });
        }
        if step.abs() < tol {
            return Ok(RootResult {
                root: x,
                f_root: f(x),
                iterations: iter,
            });
        }
    }

    Err(NumericError::MaxIterations {
        iterations: max_iter,
    })
}

/// Find every root of `f` on `[a, b]` that shows up as a sign change on a
/// uniform grid of `steps` cells. Roots closer together than one cell, or
/// even-multiplicity roots, can be missed.
pub fn find_roots<F>(f: F, a: f64, b: f64, steps: usize, tol: f64) -> NumericResult<Vec<RootResult>>
where
    F: Fn(f64) -> f64,
{
    check_bracket(a, b)?;
    let steps = steps.max(1);
    let h = (b - a) / steps as f64;

    let mut roots = Vec::new();
    let mut x_prev = a;
    let mut f_prev = eval(&f, a)?;
    if f_prev == 0.0 {
        roots.push(RootResult {
            root: a,
            f_root: 0.0,
            iterations: 0,
        });
    }

    for i in 1..=steps {
        let x = if i == steps { b } else { a + h * i as f64 };
        let fx = eval(&f, x)?;
        if fx == 0.0 {
            roots.push(RootResult {
                root: x,
                f_root: 0.0,
                iterations: 0,
            });
        } else if f_prev != 0.0 && f_prev.signum() != fx.signum() {
            roots.push(brent_root(&f, x_prev, x, tol, 200)?);
        }
        x_prev = x;
        f_prev = fx;
    }

    Ok(roots)
}

fn check_bracket(a: f64, b: f64) -> NumericResult<()> {
    if a.is_finite() && b.is_finite() && a < b {
        Ok(())
    } else {
        Err(NumericError::InvalidBracket { a, b })
    }
}

fn endpoint_root(a: f64, fa: f64, b: f64, fb: f64) -> Option<RootResult> {
    if fa == 0.0 {
        Some(RootResult {
            root: a,
            f_root: fa,
            iterations: 0,
        })
    } else if fb == 0.0 {
        Some(RootResult {
            root: b,
            f_root: fb,
            iterations: 0,
        })
    } else {
        None
    }
}

fn eval<F: Fn(f64) -> f64>(f: &F, x: f64) -> NumericResult<f64> {
    let v = f(x);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(NumericError::NonFinite { x })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(x: f64) -> f64 {
        x * x * x - 2.0 * x - 5.0
    }

    const CUBIC_ROOT: f64 = 2.094_551_481_542_326_5;

    #[test]
    fn bisect_finds_classic_cubic_root() {
        let r = bisect(cubic, 2.0, 3.0, 1e-12, 200).unwrap();
        assert!((r.root - CUBIC_ROOT).abs() < 1e-10);
    }

    #[test]
    fn brent_converges_faster_than_bisection() {
        let b = bisect(cubic, 2.0, 3.0, 1e-12, 200).unwrap();
        let r = brent_root(cubic, 2.0, 3.0, 1e-12, 100).unwrap();
        assert!((r.root - CUBIC_ROOT).abs() < 1e-10);
        assert!(r.iterations < b.iterations);
    }

    #[test]
    fn newton_uses_derivative() {
        let r = newton(cubic, |x| 3.0 * x * x - 2.0, 2.0, 1e-12, 50).unwrap();
        assert!((r.root - CUBIC_ROOT).abs() < 1e-10);
        assert!(r.iterations <= 8);
    }

    #[test]
    fn newton_reports_zero_derivative() {
        let err = newton(|x| x * x + 1.0, |x| 2.0 * x, 0.0, 1e-12, 10).unwrap_err();
        assert_eq!(err, NumericError::ZeroDerivative { x: 0.0 });
    }

    #[test]
    fn bracket_without_sign_change_is_an_error() {
        assert!(matches!(
            brent_root(|x| x * x + 1.0, -1.0, 1.0, 1e-12, 50),
            Err(NumericError::NoSignChange { .. })
        ));
        assert!(matches!(
            bisect(cubic, 3.0, 2.0, 1e-12, 50),
            Err(NumericError::InvalidBracket { .. })
        ));
    }

    #[test]
    fn find_roots_locates_all_sign_changes() {
        // x^2 + 10 sin(x) has roots at 0 and about -2.4795.
        let f = |x: f64| x * x + 10.0 * x.sin();
        let roots = find_roots(f, -10.0, 10.0, 200, 1e-12).unwrap();
        assert_eq!(roots.len(), 2, "{roots:?}");
        assert!((roots[0].root + 2.479_481).abs() < 1e-5);
        assert!(roots[1].root.abs() < 1e-10);
    }
}
