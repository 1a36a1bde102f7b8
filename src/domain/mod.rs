//! Domain types and DTOs
//!
//! These types define the data structures for activity input, emissions and
//! recommendations.

pub mod emissions;
pub mod recommendations;

pub use emissions::*;
pub use recommendations::*;
