//! Shared types and models for the Cantina point-of-sale system
//!
//! This crate contains the domain types shared between the backend and any
//! other components of the system (reporting tools, terminal clients).

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::*;
