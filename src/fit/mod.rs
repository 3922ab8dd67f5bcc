//! Model fitting and selection.
//!
//! Responsibilities:
//!
//! - least squares for polynomials (linear) and for exp-decay/gaussian shapes
//!   (Levenberg–Marquardt, multi-start in parallel)
//! - choose a polynomial degree with the nested-model F-test chain (BIC for contrast)

pub mod fitter;
pub mod lsq;
pub mod selection;

pub use fitter::*;
pub use lsq::*;
pub use selection::*;
