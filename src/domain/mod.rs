//! Domain types used throughout the notebook.
//!
//! This module defines:
//!
//! - configuration enums (`CellKind`, `CurveShape`) and `NotebookConfig`
//! - observations (`Sample`) and model families (`ModelKind`)
//! - fit outputs (`FitResult`, `FittedModel`, `CurveFile`, etc.)

pub mod types;

pub use types::*;
