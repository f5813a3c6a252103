//! HTTP API layer for mutuelle-rs.
//!
//! This crate provides the REST surface consumed by the mobile and web
//! front-ends:
//!
//! - **Endpoints**: messaging, notifications, groups, dashboard
//! - **Extractors**: authenticated-user extraction
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

// Allow dead_code for API compatibility fields in request structs
#![allow(dead_code)]

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
