//! Shared building blocks for the tour API crates: response types and
//! logging bootstrap.

pub mod types;
pub mod utils;
