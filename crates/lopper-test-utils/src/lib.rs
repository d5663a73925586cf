//! Shared test utilities for the lopper workspace.
//!
//! This crate is a dev-dependency only; it is never published.
//!
//! # Modules
//!
//! - [`repo`] - [`TestRepo`](repo::TestRepo), a scratch repository with
//!   file helpers
//! - [`server`] - [`PackServer`](server::PackServer), a loopback HTTP
//!   server for remote policy pack tests

pub mod repo;
pub mod server;
