//! stats::errors: error conditions for the statistical routines.
//!
//! Every routine in `stats` validates its inputs up front and returns
//! [`StatsResult`] instead of panicking or silently producing NaN/Inf.
//! Numeric edge cases that have a defined answer (a zero or negative
//! F-statistic, for example) are *results*, not errors.

pub type StatsResult<T> = Result<T, StatsError>;

/// StatsError: validation and computation failures in `stats`.
///
/// Variants
/// --------
/// - `InvalidNesting`
///   The richer model does not have strictly more degrees of freedom than
///   the simpler one (`dof_rich <= dof_simple`).
/// - `InsufficientData`
///   Not enough observations to leave residual degrees of freedom
///   (`n_observations <= dof_rich`).
/// - `InvalidSsr`
///   A residual sum of squares is negative or non-finite.
/// - `InvalidThreshold`
///   A decision threshold outside the open interval (0, 1).
/// - `LengthMismatch`
///   Paired inputs of different lengths.
/// - `TooFewObservations`
///   Fewer observations than the routine needs.
/// - `NonFiniteData`
///   A NaN or infinite value in the inputs.
/// - `ConstantInput`
///   Zero variance where a spread is required (e.g. regression on constant x).
/// - `InvalidExpected`
///   A non-positive or non-finite expected frequency.
/// - `Distribution`
///   `statrs` rejected the distribution parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    InvalidNesting { dof_simple: usize, dof_rich: usize },
    InsufficientData { n_observations: usize, dof_rich: usize },
    InvalidSsr { which: &'static str, value: f64 },
    InvalidThreshold(f64),
    LengthMismatch { left: usize, right: usize },
    TooFewObservations { n: usize, min: usize },
    NonFiniteData,
    ConstantInput,
    InvalidExpected(f64),
    Distribution(String),
}

impl std::error::Error for StatsError {}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::InvalidNesting {
                dof_simple,
                dof_rich,
            } => write!(
                f,
                "Invalid nesting: richer model dof ({dof_rich}) must exceed simpler model dof ({dof_simple})."
            ),
            StatsError::InsufficientData {
                n_observations,
                dof_rich,
            } => write!(
                f,
                "Insufficient data: n_observations={n_observations} must exceed richer model dof ({dof_rich})."
            ),
            StatsError::InvalidSsr { which, value } => {
                write!(f, "Invalid {which}: {value} (must be finite and >= 0).")
            }
            StatsError::InvalidThreshold(value) => {
                write!(f, "Invalid decision threshold: {value} (must lie in (0, 1)).")
            }
            StatsError::LengthMismatch { left, right } => {
                write!(f, "Length mismatch: {left} vs {right}.")
            }
            StatsError::TooFewObservations { n, min } => {
                write!(f, "Too few observations: n={n} (need at least {min}).")
            }
            StatsError::NonFiniteData => write!(f, "Input contains NaN or infinite values."),
            StatsError::ConstantInput => write!(f, "Input has zero variance."),
            StatsError::InvalidExpected(value) => {
                write!(f, "Invalid expected frequency: {value} (must be finite and > 0).")
            }
            StatsError::Distribution(msg) => write!(f, "Distribution error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_embeds_payload() {
        let msg = StatsError::InvalidNesting {
            dof_simple: 3,
            dof_rich: 1,
        }
        .to_string();
        assert!(msg.contains("(1)") && msg.contains("(3)"));

        let msg = StatsError::InvalidSsr {
            which: "ssr_rich",
            value: -1.0,
        }
        .to_string();
        assert!(msg.contains("ssr_rich") && msg.contains("-1"));
    }
}
