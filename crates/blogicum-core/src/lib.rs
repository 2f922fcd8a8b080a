//! # Blogicum Core
//!
//! The domain layer of the Blogicum blog.
//! Entities, the visibility and ownership policies, form validation and the
//! blog service that ties them to the repository ports. No infrastructure
//! dependencies live here.

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError};
