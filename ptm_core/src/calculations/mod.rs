//! # Estimate Calculations
//!
//! Calculations that combine the engines into the numbers an estimate sheet
//! shows. Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Estimate` - Results, unrounded (JSON-serializable)
//! - a pure function from input to `CalcResult<*Estimate>`
//!
//! ## Available Calculations
//!
//! - [`row_estimate`] - coating for one profile row of an estimate

pub mod row_estimate;

pub use row_estimate::{
    estimate_row, format_or_dash, round_to, CoatingSource, Quantity, QuantityUnit, RowEstimate,
    RowInput,
};
