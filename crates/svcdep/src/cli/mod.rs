//! CLI command implementations.

pub mod check;
pub mod depend;
pub mod show;
pub mod update;
