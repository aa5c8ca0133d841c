//! Database models for the Cantina POS backend
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
