//! Parametric model families (polynomial, exponential decay, gaussian).
//!
//! Models are implemented as small, pure functions so that fitting/search code can
//! stay generic.

pub mod model;

pub use model::*;
