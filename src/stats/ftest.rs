//! stats::ftest: nested-model comparison via the F-test.
//!
//! Given two fitted models where the richer one nests the simpler one, the
//! comparator asks whether the drop in residual sum of squares (SSR) is larger
//! than what the extra parameters would buy by chance:
//!
//! ```text
//! F  = ((ssr_simple - ssr_rich) / (dof_rich - dof_simple))
//!      / (ssr_rich / (n_observations - dof_rich))
//! CL = 1 - FisherCDF(F; d1 = dof_rich - dof_simple, d2 = n_observations - dof_rich)
//! ```
//!
//! The extra parameters are "justified" when `CL < threshold` (0.10 by default).
//!
//! Conventions
//! -----------
//! - Degrees of freedom are `parameter count - 1` for each model (so a straight
//!   line has dof 1, a quadratic dof 2). The arithmetic above is applied to
//!   those numbers literally.
//! - `ssr_rich > ssr_simple` is not rejected. F comes out negative, the CDF is
//!   taken as 0 for negative arguments (the `statrs` convention, enforced here
//!   explicitly), so CL = 1. Treat a negative F as a sign of a broken upstream
//!   fit, see [`FTestOutcome::is_degenerate`].
//! - `ssr_rich == 0` yields `F = +inf` and `CL = 0`, unless `ssr_simple` is
//!   also 0, in which case there is nothing to explain: `F = 0`, `CL = 1`.
//!
//! The comparator is pure: identical inputs give bit-identical outputs.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::stats::errors::{StatsError, StatsResult};

/// Confidence-level threshold below which the richer model is preferred.
pub const DEFAULT_THRESHOLD: f64 = 0.10;

/// Outcome of a nested-model comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The richer model fits significantly better.
    AdditionalParameterJustified,
    /// The richer model does not improve the fit enough; keep the simpler one.
    SimplerModelSufficient,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::AdditionalParameterJustified => "additional parameter justified",
            Decision::SimplerModelSufficient => "simpler model sufficient",
        }
    }

    pub fn prefers_richer(self) -> bool {
        matches!(self, Decision::AdditionalParameterJustified)
    }
}

/// Result of [`FTest::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FTestOutcome {
    pub f_stat: f64,
    pub confidence_level: f64,
    pub decision: Decision,
    /// Numerator degrees of freedom (`dof_rich - dof_simple`).
    pub d1: usize,
    /// Denominator degrees of freedom (`n_observations - dof_rich`).
    pub d2: usize,
}

impl FTestOutcome {
    /// `true` when the statistic is non-positive or infinite, i.e. the richer
    /// model does not fit better, or fits perfectly. Both usually point at the
    /// upstream fits rather than at the data.
    pub fn is_degenerate(&self) -> bool {
        !(self.f_stat.is_finite() && self.f_stat > 0.0)
    }
}

/// Nested-model comparator with a configurable decision threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FTest {
    threshold: f64,
}

impl Default for FTest {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl FTest {
    pub fn with_threshold(threshold: f64) -> StatsResult<Self> {
        if !(threshold.is_finite() && threshold > 0.0 && threshold < 1.0) {
            return Err(StatsError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compare a simpler model against a richer model that nests it.
    ///
    /// # Errors
    /// - [`StatsError::InvalidSsr`] for a negative or non-finite SSR
    /// - [`StatsError::InvalidNesting`] when `dof_rich <= dof_simple`
    /// - [`StatsError::InsufficientData`] when `n_observations <= dof_rich`
    pub fn compare(
        &self,
        ssr_simple: f64,
        ssr_rich: f64,
        dof_simple: usize,
        dof_rich: usize,
        n_observations: usize,
    ) -> StatsResult<FTestOutcome> {
        validate_ssr("ssr_simple", ssr_simple)?;
        validate_ssr("ssr_rich", ssr_rich)?;
        if dof_rich <= dof_simple {
            return Err(StatsError::InvalidNesting {
                dof_simple,
                dof_rich,
            });
        }
        if n_observations <= dof_rich {
            return Err(StatsError::InsufficientData {
                n_observations,
                dof_rich,
            });
        }

        let d1 = dof_rich - dof_simple;
        let d2 = n_observations - dof_rich;

        let f_stat = f_statistic(ssr_simple, ssr_rich, d1, d2);
        let confidence_level = (1.0 - fisher_cdf(f_stat, d1, d2)?).clamp(0.0, 1.0);

        let decision = if confidence_level < self.threshold {
            Decision::AdditionalParameterJustified
        } else {
            Decision::SimplerModelSufficient
        };

        Ok(FTestOutcome {
            f_stat,
            confidence_level,
            decision,
            d1,
            d2,
        })
    }
}

/// Compare two nested fits with the default 0.10 threshold.
pub fn compare(
    ssr_simple: f64,
    ssr_rich: f64,
    dof_simple: usize,
    dof_rich: usize,
    n_observations: usize,
) -> StatsResult<FTestOutcome> {
    FTest::default().compare(ssr_simple, ssr_rich, dof_simple, dof_rich, n_observations)
}

fn validate_ssr(which: &'static str, value: f64) -> StatsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidSsr { which, value })
    }
}

fn f_statistic(ssr_simple: f64, ssr_rich: f64, d1: usize, d2: usize) -> f64 {
    if ssr_rich == 0.0 {
        return if ssr_simple == 0.0 { 0.0 } else { f64::INFINITY };
    }
    ((ssr_simple - ssr_rich) / d1 as f64) / (ssr_rich / d2 as f64)
}

fn fisher_cdf(x: f64, d1: usize, d2: usize) -> StatsResult<f64> {
    // Support is [0, inf); negative statistics are mapped to CDF = 0.
    if x <= 0.0 {
        return Ok(0.0);
    }
    // statrs evaluates d1*x / (d1*x + d2); an overflowing product is the upper tail limit.
    if !(d1 as f64 * x).is_finite() {
        return Ok(1.0);
    }
    let dist = FisherSnedecor::new(d1 as f64, d2 as f64)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok(dist.cdf(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_improvement_justifies_extra_parameter() {
        let out = compare(120.0, 80.0, 1, 2, 100).unwrap();
        assert!((out.f_stat - 49.0).abs() < 1e-9, "F={}", out.f_stat);
        assert!(out.confidence_level < 1e-6, "CL={}", out.confidence_level);
        assert_eq!(out.decision, Decision::AdditionalParameterJustified);
        assert_eq!((out.d1, out.d2), (1, 98));
    }

    #[test]
    fn marginal_improvement_keeps_simpler_model() {
        let out = compare(80.5, 80.0, 2, 3, 100).unwrap();
        let expected_f = 0.5 / (80.0 / 97.0);
        assert!((out.f_stat - expected_f).abs() < 1e-12);
        assert!((out.f_stat - 0.606).abs() < 1e-3);
        // F(1, 97) at 0.606 is the square of a t(97) at ~0.78: p ~ 0.44.
        assert!(out.confidence_level > 0.3 && out.confidence_level < 0.6);
        assert_eq!(out.decision, Decision::SimplerModelSufficient);
    }

    #[test]
    fn equal_ssr_gives_zero_statistic_and_full_confidence() {
        for &(ssr, dof_s, dof_r, n) in &[(10.0, 1, 2, 20), (3.5, 0, 4, 9), (1e-3, 2, 3, 50)] {
            let out = compare(ssr, ssr, dof_s, dof_r, n).unwrap();
            assert_eq!(out.f_stat, 0.0);
            assert_eq!(out.confidence_level, 1.0);
            assert_eq!(out.decision, Decision::SimplerModelSufficient);
        }
    }

    #[test]
    fn perfect_rich_fit_gives_infinite_statistic() {
        let out = compare(5.0, 0.0, 1, 2, 30).unwrap();
        assert!(out.f_stat.is_infinite() && out.f_stat > 0.0);
        assert_eq!(out.confidence_level, 0.0);
        assert_eq!(out.decision, Decision::AdditionalParameterJustified);
        assert!(out.is_degenerate());

        let both_zero = compare(0.0, 0.0, 1, 2, 30).unwrap();
        assert_eq!(both_zero.f_stat, 0.0);
        assert_eq!(both_zero.confidence_level, 1.0);
    }

    #[test]
    fn huge_finite_statistic_saturates_confidence() {
        // F is finite but d1 * F overflows.
        let out = compare(1.0, 5e-309, 0, 2, 3).unwrap();
        assert!(out.f_stat.is_finite() && out.f_stat > 1e307);
        assert_eq!(out.confidence_level, 0.0);
        assert_eq!(out.decision, Decision::AdditionalParameterJustified);

        let wide = compare(1.0, 2e-308, 0, 10, 11).unwrap();
        assert_eq!(wide.confidence_level, 0.0);
    }

    #[test]
    fn confidence_approaches_zero_as_rich_ssr_vanishes() {
        let mut prev = f64::INFINITY;
        for &ssr_rich in &[1.0, 1e-2, 1e-4, 1e-8] {
            let out = compare(10.0, ssr_rich, 1, 2, 25).unwrap();
            assert!(out.f_stat > 0.0 && out.f_stat.is_finite());
            assert!(out.confidence_level <= prev + 1e-15);
            prev = out.confidence_level;
        }
        assert!(prev < 1e-12);
    }

    #[test]
    fn confidence_is_non_increasing_in_improvement() {
        let ssr_simple = 100.0;
        let mut prev = 1.0;
        for i in 0..50 {
            let ssr_rich = ssr_simple - i as f64 * 1.9;
            let out = compare(ssr_simple, ssr_rich, 1, 3, 40).unwrap();
            assert!(
                out.confidence_level <= prev + 1e-15,
                "CL rose from {prev} to {} at step {i}",
                out.confidence_level
            );
            prev = out.confidence_level;
        }
    }

    #[test]
    fn worse_rich_fit_yields_negative_statistic_not_error() {
        let out = compare(50.0, 60.0, 1, 2, 20).unwrap();
        assert!(out.f_stat < 0.0);
        assert_eq!(out.confidence_level, 1.0);
        assert_eq!(out.decision, Decision::SimplerModelSufficient);
        assert!(out.is_degenerate());
    }

    #[test]
    fn invalid_nesting_is_rejected() {
        for &(dof_s, dof_r) in &[(1, 1), (2, 1), (5, 0), (3, 3)] {
            let err = compare(10.0, 5.0, dof_s, dof_r, 100).unwrap_err();
            assert_eq!(
                err,
                StatsError::InvalidNesting {
                    dof_simple: dof_s,
                    dof_rich: dof_r
                }
            );
        }
    }

    #[test]
    fn insufficient_data_is_rejected() {
        for &(dof_r, n) in &[(2, 2), (3, 1), (4, 0), (10, 10)] {
            let err = compare(10.0, 5.0, 1, dof_r, n).unwrap_err();
            assert_eq!(
                err,
                StatsError::InsufficientData {
                    n_observations: n,
                    dof_rich: dof_r
                }
            );
        }
    }

    #[test]
    fn nesting_is_checked_before_data_size() {
        let err = compare(10.0, 5.0, 3, 2, 1).unwrap_err();
        assert!(matches!(err, StatsError::InvalidNesting { .. }));
    }

    #[test]
    fn invalid_ssr_is_rejected() {
        assert!(matches!(
            compare(f64::NAN, 1.0, 1, 2, 10),
            Err(StatsError::InvalidSsr { which: "ssr_simple", .. })
        ));
        assert!(matches!(
            compare(1.0, -0.5, 1, 2, 10),
            Err(StatsError::InvalidSsr { which: "ssr_rich", .. })
        ));
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let a = compare(33.3, 21.7, 2, 4, 57).unwrap();
        let b = compare(33.3, 21.7, 2, 4, 57).unwrap();
        assert_eq!(a.f_stat.to_bits(), b.f_stat.to_bits());
        assert_eq!(a.confidence_level.to_bits(), b.confidence_level.to_bits());
        assert_eq!(a.decision, b.decision);
    }

    #[test]
    fn custom_threshold_changes_decision() {
        let loose = FTest::with_threshold(0.5).unwrap();
        let out = loose.compare(80.5, 80.0, 2, 3, 100).unwrap();
        assert_eq!(out.decision, Decision::AdditionalParameterJustified);

        assert!(FTest::with_threshold(0.0).is_err());
        assert!(FTest::with_threshold(1.0).is_err());
        assert!(FTest::with_threshold(f64::NAN).is_err());
    }
}
