//! # Blogicum Shared
//!
//! Wire types returned by the API: resource views built from the core
//! service results, and RFC 7807 error bodies.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
