//! Seeded synthetic samples for the notebook cells.
//!
//! Every generator takes an explicit seed so a run is reproducible from
//! `(seed, sample_count, noise)` alone. Each cell derives its own seed from the
//! base seed, which keeps cells independent of one another: re-running a single
//! cell gives the same data as running the whole notebook.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{CellKind, CurveShape, Sample};
use crate::error::AppError;

/// Ground truth for the regression cell: `y = 2.0 + 0.75 x`.
pub const LINE_TRUTH: [f64; 2] = [2.0, 0.75];

/// Polynomial coefficients (lowest order first) for the F-test cell; truncated
/// to the requested true degree.
pub const POLY_TRUTH: [f64; 6] = [0.5, 1.5, -0.8, 0.3, -0.08, 0.02];

/// `a·exp(-b·x) + c`
pub const EXP_DECAY_TRUTH: [f64; 3] = [3.0, 1.2, 0.5];

/// `a·exp(-(x-μ)²/(2s²))`
pub const GAUSSIAN_TRUTH: [f64; 3] = [2.5, 1.0, 0.6];

/// Mean and standard deviation of the draws binned by the goodness cell.
pub const DRAW_TRUTH: (f64, f64) = (10.0, 2.0);

/// Seed for one cell, derived from the run's base seed.
pub fn cell_seed(base: u64, cell: CellKind) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    cell.hash(&mut hasher);
    hasher.finish()
}

/// Noisy straight line on `x ∈ [0, 10]` (uniform x).
pub fn linear_sample(seed: u64, n: usize, noise: f64) -> Result<Sample, AppError> {
    validate(n, noise)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = noise_dist(noise)?;

    let mut x: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..=10.0)).collect();
    x.sort_by(f64::total_cmp);
    let y = x
        .iter()
        .map(|&xi| LINE_TRUTH[0] + LINE_TRUTH[1] * xi + normal.sample(&mut rng))
        .collect();
    Ok(Sample { x, y, sigma: None })
}

/// Noisy polynomial of degree `true_degree` on an even grid over `[-3, 3]`.
pub fn polynomial_sample(seed: u64, n: usize, true_degree: usize, noise: f64) -> Result<Sample, AppError> {
    validate(n, noise)?;
    if true_degree >= POLY_TRUTH.len() {
        return Err(AppError::invalid_input(format!(
            "True degree must be at most {}.",
            POLY_TRUTH.len() - 1
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = noise_dist(noise)?;
    let coeffs = &POLY_TRUTH[..=true_degree];

    let x = linspace(-3.0, 3.0, n);
    let y = x
        .iter()
        .map(|&xi| {
            let clean = coeffs.iter().rev().fold(0.0, |acc, &c| acc * xi + c);
            clean + normal.sample(&mut rng)
        })
        .collect();
    Ok(Sample { x, y, sigma: None })
}

/// Noisy exponential decay or gaussian bump, with per-point `sigma`.
///
/// Noise grows mildly with `x` so that the weighted fit differs from the
/// unweighted one.
pub fn curve_sample(seed: u64, n: usize, shape: CurveShape, noise: f64) -> Result<Sample, AppError> {
    validate(n, noise)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let standard = noise_dist(1.0)?;

    let (x, truth): (Vec<f64>, &[f64; 3]) = match shape {
        CurveShape::ExpDecay => (linspace(0.0, 4.0, n), &EXP_DECAY_TRUTH),
        CurveShape::Gaussian => (linspace(-1.0, 3.0, n), &GAUSSIAN_TRUTH),
    };
    let model = shape.model_kind();

    // Curve noise is scaled down: these shapes live on [0, 3].
    let base = 0.1 * noise;
    let (x_min, x_max) = (x[0], x[n - 1]);
    let span = (x_max - x_min).max(1e-12);

    let mut y = Vec::with_capacity(n);
    let mut sigma = Vec::with_capacity(n);
    for &xi in &x {
        let s = (base * (1.0 + 0.5 * (xi - x_min) / span)).max(1e-6);
        y.push(crate::models::predict(model, xi, truth) + s * standard.sample(&mut rng));
        sigma.push(s);
    }
    Ok(Sample {
        x,
        y,
        sigma: Some(sigma),
    })
}

/// `n` independent draws from `N(mean, sd)`.
pub fn normal_draws(seed: u64, n: usize, mean: f64, sd: f64) -> Result<Vec<f64>, AppError> {
    if n == 0 {
        return Err(AppError::invalid_input("Sample count must be > 0."));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(mean, sd)
        .map_err(|e| AppError::invalid_input(format!("Invalid normal parameters: {e}")))?;
    Ok((0..n).map(|_| dist.sample(&mut rng)).collect())
}

/// Exact samples of `f` at `count` evenly spaced knots over `[a, b]`.
pub fn knots<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, count: usize) -> Result<Sample, AppError> {
    if count < 2 {
        return Err(AppError::invalid_input("Need at least 2 interpolation knots."));
    }
    if !(a.is_finite() && b.is_finite() && b > a) {
        return Err(AppError::invalid_input("Invalid knot range."));
    }
    let x = linspace(a, b, count);
    let y = x.iter().map(|&v| f(v)).collect();
    Ok(Sample { x, y, sigma: None })
}

/// `n` evenly spaced points from `a` to `b` inclusive.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f64;
            (0..n).map(|i| a + step * i as f64).collect()
        }
    }
}

fn validate(n: usize, noise: f64) -> Result<(), AppError> {
    if n == 0 {
        return Err(AppError::invalid_input("Sample count must be > 0."));
    }
    if !(noise.is_finite() && noise >= 0.0) {
        return Err(AppError::invalid_input(format!("Invalid noise level {noise}.")));
    }
    Ok(())
}

fn noise_dist(sd: f64) -> Result<Normal<f64>, AppError> {
    Normal::new(0.0, sd).map_err(|e| AppError::numerical(format!("Noise distribution error: {e}")))
}
