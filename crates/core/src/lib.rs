//! Core business logic for mutuelle-rs.

pub mod services;

pub use services::*;
