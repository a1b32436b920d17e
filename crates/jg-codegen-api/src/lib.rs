//! JOI code generation API, library crate.
//!
//! Re-exports all modules so the binary (`main.rs`) and external crates
//! (e.g. `jg-e2e-tests`) can access `AppState`, `build_router`, the
//! pipeline and the service traits.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod routes;
pub mod services;
pub mod site_store;
pub mod state;
