//! Foundational data structures, error types, values and record shapes.

pub mod error;
pub mod models;
pub mod record;
pub mod value;
