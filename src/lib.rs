//! Diagnostic plots for parameter-sweep simulation campaigns.
//!
//! Loads a semicolon-delimited results table (one row per simulation run),
//! reshapes each requested metric over one or two swept parameters and
//! renders a grid of line, curve-family or filled-contour panels.

pub mod cli;
pub mod plotting;
pub mod results_table;
pub mod sweep_grid;
