//! Request and Response models for the HTTP cache
//!
//! This module defines the values a cached request is built from and the
//! response value the executor hands back.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{HttpMethod, RequestBody, RequestOptions, StaleCallback};
pub use responses::{HttpResponse, ResponseSummary};
