//! Polynomial degree selection.
//!
//! Two views on "how many parameters does the data support":
//!
//! - an F-test chain: fit degrees 1, 2, ... and compare each pair of
//!   neighbours; stop at the first step where the richer model is not
//!   justified and keep the simpler one
//! - BIC = n * ln(SSE/n) + k * ln(n), reported alongside for contrast
//!
//! The F-test chain is the primary answer. BIC prefers the simplest model
//! within 2 points of the minimum.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{FitResult, ModelKind, Sample};
use crate::error::AppError;
use crate::fit::fitter::fit_polynomial;
use crate::stats::{FTest, FTestOutcome};

/// One comparison in the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FTestStep {
    pub simple: ModelKind,
    pub rich: ModelKind,
    pub ssr_simple: f64,
    pub ssr_rich: f64,
    pub dof_simple: usize,
    pub dof_rich: usize,
    pub n_observations: usize,
    pub outcome: FTestOutcome,
}

/// Output of [`select_polynomial`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeSelection {
    /// Every polynomial that was fitted, lowest degree first.
    pub fits: Vec<FitResult>,
    /// Comparisons actually performed (the chain stops early).
    pub steps: Vec<FTestStep>,
    /// Degrees that could not be fitted and why.
    pub skipped: Vec<(usize, String)>,
    /// Model kept by the F-test chain.
    pub chosen: FitResult,
    /// Model preferred by BIC.
    pub bic_choice: FitResult,
}

/// Fit polynomials of degree `1..=max_degree` and select one with the F-test chain.
///
/// Degrees with too few observations (`n <= degree + 1`) are skipped. At least
/// one degree must be fittable.
pub fn select_polynomial(
    sample: &Sample,
    max_degree: usize,
    test: &FTest,
) -> Result<DegreeSelection, AppError> {
    if max_degree == 0 {
        return Err(AppError::invalid_input("max degree must be at least 1."));
    }
    let n = sample.len();

    let mut fits = Vec::new();
    let mut skipped = Vec::new();
    for degree in 1..=max_degree {
        let k = degree + 1;
        if n <= k {
            skipped.push((degree, format!("Underdetermined: n={n} <= k={k}")));
            continue;
        }
        fits.push(fit_polynomial(sample, degree)?);
    }

    if fits.is_empty() {
        return Err(AppError::insufficient_data(format!(
            "Insufficient data to fit any polynomial (n={n})."
        )));
    }

    let mut steps = Vec::new();
    let mut chosen = 0;
    for rich in 1..fits.len() {
        let step = compare_fits(&fits[chosen], &fits[rich], n, test)?;
        debug!(
            simple = %step.simple.display_name(),
            rich = %step.rich.display_name(),
            f = step.outcome.f_stat,
            cl = step.outcome.confidence_level,
            "f-test step"
        );
        let justified = step.outcome.decision.prefers_richer();
        steps.push(step);
        if !justified {
            break;
        }
        chosen = rich;
    }

    let chosen = fits[chosen].clone();
    let bic_choice = select_by_bic(&fits);
    info!(
        ftest = %chosen.model.display_name,
        bic = %bic_choice.model.display_name,
        "polynomial degree selected"
    );

    Ok(DegreeSelection {
        fits,
        steps,
        skipped,
        chosen,
        bic_choice,
    })
}

/// Run the comparator on two fitted models over the same `n` observations.
pub fn compare_fits(
    simple: &FitResult,
    rich: &FitResult,
    n_observations: usize,
    test: &FTest,
) -> Result<FTestStep, AppError> {
    let dof_simple = simple.model.kind.dof();
    let dof_rich = rich.model.kind.dof();
    let outcome = test.compare(
        simple.quality.sse,
        rich.quality.sse,
        dof_simple,
        dof_rich,
        n_observations,
    )?;
    Ok(FTestStep {
        simple: simple.model.kind,
        rich: rich.model.kind,
        ssr_simple: simple.quality.sse,
        ssr_rich: rich.quality.sse,
        dof_simple,
        dof_rich,
        n_observations,
        outcome,
    })
}

/// Minimum BIC, preferring the simplest fit within 2 points of it.
///
/// `fits` must be non-empty and ordered by increasing complexity.
fn select_by_bic(fits: &[FitResult]) -> FitResult {
    let best_bic = fits
        .iter()
        .map(|f| f.quality.bic)
        .fold(f64::INFINITY, f64::min);

    fits.iter()
        .find(|f| f.quality.bic <= best_bic + 2.0)
        .unwrap_or(&fits[0])
        .clone()
}
