//! Shared types and domain logic for the BASP marketplace
//!
//! This crate contains the pure parts of the platform (discovery ranking,
//! star scoring, pagination and input validation) so that the backend and
//! the web client (via WASM) compute them identically.

pub mod geo;
pub mod models;
pub mod pagination;
pub mod ranking;
pub mod scoring;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
