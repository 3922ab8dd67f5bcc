//! Input/output helpers.
//!
//! - whole-run JSON export (`export`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod export;

pub use curve::*;
pub use export::*;
