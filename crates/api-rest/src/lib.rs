//! # API REST
//!
//! REST API implementation for the mural visitor annotation service.
//!
//! Handles:
//! - HTTP endpoints with axum (field editing, uploads, drawings, rendering)
//! - The `{code, message}` error envelope with stable machine codes
//! - Request context (client IP) built once at the transport boundary
//! - OpenAPI/Swagger documentation
//!
//! Domain logic lives in `mural-core`; this crate only adapts it to HTTP.

#![warn(rust_2018_idioms)]

pub mod context;
pub mod error;
pub mod handlers;

pub use context::RequestContext;
pub use error::ApiError;
pub use handlers::{build_router, ApiDoc, AppState};
