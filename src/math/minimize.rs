//! Bounded scalar minimization.
//!
//! Both local methods assume a single minimum inside `[a, b]`. For multi-modal
//! objectives use [`minimize_global`], which scans a grid first (in parallel)
//! and refines the best cell.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::errors::{NumericError, NumericResult};

/// `(3 - sqrt(5)) / 2`, the golden-section fraction.
const CGOLD: f64 = 0.381_966_011_250_105_1;

/// Guards the relative tolerance when the minimum sits at `x = 0`.
const ZEPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinResult {
    pub x: f64,
    pub fx: f64,
    pub iterations: usize,
}

pub fn golden_section<F>(f: F, a: f64, b: f64, tol: f64, max_iter: usize) -> NumericResult<MinResult>
where
    F: Fn(f64) -> f64,
{
    check_interval(a, b)?;
    let (mut a, mut b) = (a, b);
    let inv_phi = 1.0 - CGOLD;

    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = eval(&f, c)?;
    let mut fd = eval(&f, d)?;

    for iter in 1..=max_iter {
        if (b - a).abs() <= tol {
            let x = 0.5 * (a + b);
            return Ok(MinResult {
                x,
                fx: eval(&f, x)?,
                iterations: iter,
            });
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = eval(&f, c)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = eval(&f, d)?;
        }
    }

    Err(NumericError::MaxIterations {
        iterations: max_iter,
    })
}

/// Brent's method (parabolic interpolation + golden section) on `[a, b]`.
///
/// `xtol` is a relative tolerance on `x`.
pub fn brent_minimize<F>(f: F, a: f64, b: f64, xtol: f64, max_iter: usize) -> NumericResult<MinResult>
where
    F: Fn(f64) -> f64,
{
    check_interval(a, b)?;
    let (lo, hi) = (a, b);
    let (mut a, mut b) = (a, b);

    let mut x = a + CGOLD * (b - a);
    let mut w = x;
    let mut v = x;
    let mut fx = eval(&f, x)?;
    let mut fw = fx;
    let mut fv = fx;
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for iter in 1..=max_iter {
        let xm = 0.5 * (a + b);
        let tol1 = xtol * x.abs() + ZEPS;
        let tol2 = 2.0 * tol1;
        if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
            return Ok(MinResult {
                x,
                fx,
                iterations: iter,
            });
        }

        let mut golden = true;
        if e.abs() > tol1 {
            // Try a parabola through (v, w, x).
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let e_prev = e;
            e = d;
            if !(p.abs() >= (0.5 * q * e_prev).abs() || p <= q * (a - x) || p >= q * (b - x)) {
                d = p / q;
                let u = x + d;
                if u - a < tol2 || b - u < tol2 {
                    d = tol1.copysign(xm - x);
                }
                golden = false;
            }
        }
        if golden {
            e = if x >= xm { a - x } else { b - x };
            d = CGOLD * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        }
        .clamp(lo, hi);
        let fu = eval(&f, u)?;

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    Err(NumericError::MaxIterations {
        iterations: max_iter,
    })
}

/// Grid scan over `[a, b]` followed by a bounded Brent refinement around the
/// best grid point.
///
/// The scan is evaluated in parallel; the lowest value wins and ties go to
/// the smaller grid index, so the result is deterministic.
pub fn minimize_global<F>(f: F, a: f64, b: f64, steps: usize, xtol: f64) -> NumericResult<MinResult>
where
    F: Fn(f64) -> f64 + Sync,
{
    check_interval(a, b)?;
    let steps = steps.max(2);
    let h = (b - a) / steps as f64;

    let values: Vec<(usize, f64)> = (0..=steps)
        .into_par_iter()
        .map(|i| (i, f(grid_x(a, b, h, i, steps))))
        .filter(|(_, v)| v.is_finite())
        .collect();

    let Some(&(first_idx, first_val)) = values.first() else {
        return Err(NumericError::NonFinite { x: a });
    };
    let mut best = (first_idx, first_val);
    for &(i, v) in &values[1..] {
        if v < best.1 || (v == best.1 && i < best.0) {
            best = (i, v);
        }
    }

    let lo = grid_x(a, b, h, best.0.saturating_sub(1), steps);
    let hi = grid_x(a, b, h, (best.0 + 1).min(steps), steps);
    let refined = brent_minimize(&f, lo, hi, xtol, 500)?;

    // Brent may settle on an interior point that is no better than the grid.
    if refined.fx <= best.1 {
        Ok(refined)
    } else {
        Ok(MinResult {
            x: grid_x(a, b, h, best.0, steps),
            fx: best.1,
            iterations: refined.iterations,
        })
    }
}

fn grid_x(a: f64, b: f64, h: f64, i: usize, steps: usize) -> f64 {
    if i >= steps { b } else { a + h * i as f64 }
}

fn check_interval(a: f64, b: f64) -> NumericResult<()> {
    if a.is_finite() && b.is_finite() && a < b {
        Ok(())
    } else {
        Err(NumericError::InvalidBracket { a, b })
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

    fn wavy(x: f64) -> f64 {
        x * x + 10.0 * x.sin()
    }

    /// Global minimum of `x^2 + 10 sin(x)`.
    const WAVY_MIN: f64 = -1.306_440_08;

    #[test]
    fn golden_section_on_parabola() {
        let r = golden_section(|x| (x - 1.5) * (x - 1.5) + 2.0, -4.0, 4.0, 1e-9, 200).unwrap();
        assert!((r.x - 1.5).abs() < 1e-8);
        assert!((r.fx - 2.0).abs() < 1e-12);
    }

    #[test]
    fn brent_on_parabola() {
        let r = brent_minimize(|x| (x - 1.5) * (x - 1.5) + 2.0, -4.0, 4.0, 1e-10, 200).unwrap();
        assert!((r.x - 1.5).abs() < 1e-7);
        assert!(r.iterations < 50);
    }

    #[test]
    fn brent_finds_local_minimum_in_bracket() {
        let r = brent_minimize(wavy, -4.0, 0.0, 1e-10, 200).unwrap();
        assert!((r.x - WAVY_MIN).abs() < 1e-6, "x={}", r.x);
    }

    #[test]
    fn brent_respects_bounds_for_monotone_objective() {
        let r = brent_minimize(|x| x, 1.0, 2.0, 1e-10, 500).unwrap();
        assert!(r.x >= 1.0 && r.x < 1.0 + 1e-6, "x={}", r.x);
    }

    #[test]
    fn global_scan_avoids_local_minimum() {
        // The local minimum near x = 3.84 is a trap for a single Brent run on [0, 10].
        let r = minimize_global(wavy, -10.0, 10.0, 100, 1e-10).unwrap();
        assert!((r.x - WAVY_MIN).abs() < 1e-6, "x={}", r.x);
        assert!((r.fx + 7.945_823).abs() < 1e-5);
    }
}
