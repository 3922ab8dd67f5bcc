//! Simple linear regression `y = intercept + slope * x`.
//!
//! Reports the usual summary: slope/intercept, Pearson's r, the two-sided
//! p-value for the null hypothesis of zero slope (Student's t with `n - 2`
//! degrees of freedom), and the standard errors of slope and intercept.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::stats::errors::{StatsError, StatsResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinRegress {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    pub p_value: f64,
    pub stderr: f64,
    pub intercept_stderr: f64,
    pub n: usize,
}

impl LinRegress {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }
}

/// Ordinary least-squares line through `(x, y)`.
pub fn linregress(x: &[f64], y: &[f64]) -> StatsResult<LinRegress> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let n = x.len();
    if n < 3 {
        return Err(StatsError::TooFewObservations { n, min: 3 });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(StatsError::NonFiniteData);
    }

    let n_f = n as f64;
    let x_mean = x.iter().sum::<f64>() / n_f;
    let y_mean = y.iter().sum::<f64>() / n_f;

    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ssxm += dx * dx;
        ssym += dy * dy;
        ssxym += dx * dy;
    }
    if ssxm <= 0.0 {
        return Err(StatsError::ConstantInput);
    }

    let r_den = (ssxm * ssym).sqrt();
    let r_value = if r_den == 0.0 {
        0.0
    } else {
        (ssxym / r_den).clamp(-1.0, 1.0)
    };

    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;

    let df = n_f - 2.0;
    let one_minus_r2 = ((1.0 - r_value) * (1.0 + r_value)).max(0.0);
    let p_value = if one_minus_r2 == 0.0 {
        0.0
    } else {
        let t = r_value * (df / one_minus_r2).sqrt();
        let dist =
            StudentsT::new(0.0, 1.0, df).map_err(|e| StatsError::Distribution(e.to_string()))?;
        (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0)
    };

    let stderr = (one_minus_r2 * ssym / ssxm / df).sqrt();
    let intercept_stderr = stderr * (ssxm / n_f + x_mean * x_mean).sqrt();

    Ok(LinRegress {
        slope,
        intercept,
        r_value,
        p_value,
        stderr,
        intercept_stderr,
        n,
    })
}
