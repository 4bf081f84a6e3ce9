//! Shared types, errors, and configuration for Ledgerbook.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - Identity resolution (JWT credentials to user ids)

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, IdentityError, IdentityResolver};
pub use config::{AppConfig, DatabaseConfig, JwtConfig, LedgerConfig, ServerConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod jwt_tests;
