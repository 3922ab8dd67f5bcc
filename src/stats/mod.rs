//! Statistical routines: the nested-model F-test, linear regression, and
//! χ² goodness-of-fit.
//!
//! Distribution functions come from `statrs`.

pub mod errors;
pub mod ftest;
pub mod gof;
pub mod regression;

pub use errors::*;
pub use ftest::*;
pub use gof::*;
pub use regression::*;
