//! Numerical building blocks: root finding, scalar minimization,
//! interpolation, and linear least squares.

pub mod errors;
pub mod interp;
pub mod minimize;
pub mod ols;
pub mod roots;

pub use errors::*;
pub use interp::*;
pub use minimize::*;
pub use ols::*;
pub use roots::*;
