//! One-dimensional interpolation on strictly increasing knots.
//!
//! - [`LinearInterp`]: piecewise linear.
//! - [`CubicSpline`]: natural cubic spline (zero second derivative at both ends).
//!
//! Outside the knot range both interpolants extend their first/last segment.

use crate::math::errors::{NumericError, NumericResult};

#[derive(Debug, Clone)]
pub struct LinearInterp {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterp {
    pub fn new(xs: &[f64], ys: &[f64]) -> NumericResult<Self> {
        validate_knots(xs, ys)?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let i = segment(&self.xs, x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Build a natural spline.
    pub fn natural(xs: &[f64], ys: &[f64]) -> NumericResult<Self> {
        validate_knots(xs, ys)?;
        let n = xs.len();
        let mut m = vec![0.0; n];

        if n > 2 {
            // Tridiagonal system for the interior second derivatives, solved with
            // the Thomas algorithm. Rows are strictly diagonally dominant.
            let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
            let k = n - 2;
            let mut diag = vec![0.0; k];
            let mut upper = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            for j in 0..k {
                let i = j + 1;
                diag[j] = 2.0 * (h[i - 1] + h[i]);
                upper[j] = h[i];
                rhs[j] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
            }
            // Sub-diagonal entry of row j is h[j] (== upper[j - 1]).
            for j in 1..k {
                let w = h[j] / diag[j - 1];
                diag[j] -= w * upper[j - 1];
                rhs[j] -= w * rhs[j - 1];
            }
            let mut sol = vec![0.0; k];
            sol[k - 1] = rhs[k - 1] / diag[k - 1];
            for j in (0..k - 1).rev() {
                sol[j] = (rhs[j] - upper[j] * sol[j + 1]) / diag[j];
            }
            m[1..n - 1].copy_from_slice(&sol);
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m,
        })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let i = segment(&self.xs, x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let h = x1 - x0;
        let a = (x1 - x) / h;
        let b = (x - x0) / h;
        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0
    }
}

/// Index of the segment `[xs[i], xs[i+1]]` used to evaluate `x`.
fn segment(xs: &[f64], x: f64) -> usize {
    let upper = xs.partition_point(|&k| k <= x);
    upper.saturating_sub(1).min(xs.len() - 2)
}

fn validate_knots(xs: &[f64], ys: &[f64]) -> NumericResult<()> {
    if xs.len() != ys.len() {
        return Err(NumericError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(NumericError::InvalidKnots(format!(
            "need at least 2 knots, got {}",
            xs.len()
        )));
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(NumericError::InvalidKnots("non-finite value".to_string()));
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(NumericError::InvalidKnots(
            "x must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_hits_knots_and_midpoints() {
        let li = LinearInterp::new(&[0.0, 1.0, 3.0], &[0.0, 2.0, 0.0]).unwrap();
        assert_eq!(li.eval(1.0), 2.0);
        assert!((li.eval(0.5) - 1.0).abs() < 1e-12);
        assert!((li.eval(2.0) - 1.0).abs() < 1e-12);
        // Extends the last segment.
        assert!((li.eval(4.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn spline_reproduces_knots_and_lines() {
        let xs = [0.0, 1.0, 2.5, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 1.0 - 2.0 * x).collect();
        let s = CubicSpline::natural(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert!((s.eval(x) - y).abs() < 1e-12);
        }
        assert!((s.eval(3.3) - (1.0 - 6.6)).abs() < 1e-12);
    }

    #[test]
    fn spline_beats_linear_on_smooth_function() {
        let xs: Vec<f64> = (0..=10).map(|i| i as f64 * 0.6).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let li = LinearInterp::new(&xs, &ys).unwrap();
        let cs = CubicSpline::natural(&xs, &ys).unwrap();

        let mut err_lin: f64 = 0.0;
        let mut err_spl: f64 = 0.0;
        for i in 0..=120 {
            let x = 0.6 + i as f64 * (4.8 / 120.0);
            err_lin = err_lin.max((li.eval(x) - x.sin()).abs());
            err_spl = err_spl.max((cs.eval(x) - x.sin()).abs());
        }
        assert!(err_spl < err_lin / 3.0, "spline {err_spl} vs linear {err_lin}");
    }

    #[test]
    fn rejects_unsorted_knots() {
        assert!(matches!(
            CubicSpline::natural(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]),
            Err(NumericError::InvalidKnots(_))
        ));
        assert!(matches!(
            LinearInterp::new(&[0.0], &[0.0]),
            Err(NumericError::InvalidKnots(_))
        ));
    }
}
