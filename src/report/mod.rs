//! Reporting utilities: residual rankings and formatted terminal output.

use crate::domain::PointResidual;

pub mod format;

pub use format::*;

/// Largest residuals on either side of a fitted curve (top-N each side).
#[derive(Debug, Clone)]
pub struct Rankings {
    pub above: Vec<PointResidual>,
    pub below: Vec<PointResidual>,
}

/// Rank points lying furthest above and below the fit.
///
/// Only points on the respective side are kept, so either list may be shorter
/// than `top_n`.
pub fn rank_residuals(residuals: &[PointResidual], top_n: usize) -> Rankings {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual.total_cmp(&a.residual));

    let above = sorted
        .iter()
        .filter(|r| r.residual > 0.0)
        .take(top_n)
        .copied()
        .collect();
    let below = sorted
        .iter()
        .rev()
        .filter(|r| r.residual < 0.0)
        .take(top_n)
        .copied()
        .collect();

    Rankings { above, below }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(x: f64, residual: f64) -> PointResidual {
        PointResidual {
            x,
            y_obs: residual,
            y_fit: 0.0,
            residual,
        }
    }

    #[test]
    fn rank_residuals_basic() {
        let residuals = vec![res(1.0, 0.0), res(2.0, 5.0), res(3.0, -5.0), res(4.0, 1.0)];
        let rankings = rank_residuals(&residuals, 1);
        assert_eq!(rankings.above.len(), 1);
        assert_eq!(rankings.above[0].x, 2.0);
        assert_eq!(rankings.below.len(), 1);
        assert_eq!(rankings.below[0].x, 3.0);
    }

    #[test]
    fn zero_residuals_are_on_neither_side() {
        let rankings = rank_residuals(&[res(1.0, 0.0)], 3);
        assert!(rankings.above.is_empty());
        assert!(rankings.below.is_empty());
    }
}
