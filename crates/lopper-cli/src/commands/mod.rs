//! Command implementations for lopper-cli

pub mod resolve;

pub use resolve::{run_resolve, run_validate};
