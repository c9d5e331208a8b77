//! # NorthBridge Shared Library
//!
//! Types, persistence and authentication primitives used by the NorthBridge
//! API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `auth`: Password hashing, JWT, principals and the capability policy
//! - `db`: Connection pool and migration helpers

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the NorthBridge shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
