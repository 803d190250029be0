//! Shared types, errors, and configuration for Moneylog.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - Bearer token verification

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, CommitMode, LedgerConfig, OccurredNullPolicy};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
