//! # Blogicum Infrastructure
//!
//! Concrete implementations of the ports defined in `blogicum-core`.
//! This crate contains the database layer, the in-memory store, the clock
//! and the authentication services.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL database support via SeaORM
//! - `minimal` - No external database, in-memory store only

pub mod auth;
pub mod clock;
pub mod database;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use clock::{FixedClock, SystemClock};
pub use database::{DatabaseConfig, InMemoryStore};
