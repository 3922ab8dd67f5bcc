//! Goodness-of-fit tests based on the χ² distribution.
//!
//! - [`chisquare`]: Pearson's test of observed vs expected frequencies.
//! - [`reduced_chi_square`]: χ² of a weighted fit's residuals against their
//!   measurement uncertainties.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::stats::errors::{StatsError, StatsResult};

/// Result of Pearson's χ² test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareOutcome {
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
}

/// Pearson's χ² test with `k - 1 - ddof` degrees of freedom.
///
/// `ddof` is the number of distribution parameters estimated from the same
/// data used to build the expected frequencies.
pub fn chisquare(observed: &[f64], expected: &[f64], ddof: usize) -> StatsResult<ChiSquareOutcome> {
    if observed.len() != expected.len() {
        return Err(StatsError::LengthMismatch {
            left: observed.len(),
            right: expected.len(),
        });
    }
    let k = observed.len();
    let min = ddof + 2;
    if k < min {
        return Err(StatsError::TooFewObservations { n: k, min });
    }
    if observed.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::NonFiniteData);
    }
    if let Some(&bad) = expected.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(StatsError::InvalidExpected(bad));
    }

    let statistic: f64 = observed
        .iter()
        .zip(expected)
        .map(|(&o, &e)| (o - e) * (o - e) / e)
        .sum();
    let dof = k - 1 - ddof;
    let p_value = chi2_upper_tail(statistic, dof)?;

    Ok(ChiSquareOutcome {
        statistic,
        dof,
        p_value,
    })
}

/// χ² summary of residuals weighted by their uncertainties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReducedChiSquare {
    pub chi2: f64,
    pub dof: usize,
    /// `chi2 / dof`; close to 1 for a good fit with correct uncertainties.
    pub reduced: f64,
    pub p_value: f64,
}

pub fn reduced_chi_square(
    residuals: &[f64],
    sigma: &[f64],
    n_params: usize,
) -> StatsResult<ReducedChiSquare> {
    if residuals.len() != sigma.len() {
        return Err(StatsError::LengthMismatch {
            left: residuals.len(),
            right: sigma.len(),
        });
    }
    let n = residuals.len();
    if n <= n_params {
        return Err(StatsError::TooFewObservations {
            n,
            min: n_params + 1,
        });
    }
    if residuals.iter().chain(sigma).any(|v| !v.is_finite()) || sigma.iter().any(|s| *s <= 0.0) {
        return Err(StatsError::NonFiniteData);
    }

    let chi2: f64 = residuals
        .iter()
        .zip(sigma)
        .map(|(&r, &s)| (r / s) * (r / s))
        .sum();
    let dof = n - n_params;
    Ok(ReducedChiSquare {
        chi2,
        dof,
        reduced: chi2 / dof as f64,
        p_value: chi2_upper_tail(chi2, dof)?,
    })
}

fn chi2_upper_tail(x: f64, dof: usize) -> StatsResult<f64> {
    let dist = ChiSquared::new(dof as f64).map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok((1.0 - dist.cdf(x)).clamp(0.0, 1.0))
}
