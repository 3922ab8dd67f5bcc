//! `fit-notebook` library crate.
//!
//! A small numerical notebook: root finding, scalar minimization, regression,
//! goodness-of-fit, nonlinear curve fitting, interpolation, and nested-model
//! selection with the F-test.
//!
//! The binary (`nb`) is a thin wrapper around this library so that:
//!
//! - every cell is testable without spawning processes
//! - the numerical building blocks (`math`, `stats`, `fit`) are reusable on their own

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod stats;
pub mod tui;
