//! Mock inventory module.
//!
//! Generates a synthetic, internally consistent cloud host inventory.

mod generator;
mod models;
mod snapshot;

pub use generator::*;
pub use models::*;
pub use snapshot::*;
