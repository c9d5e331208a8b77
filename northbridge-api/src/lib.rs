//! # NorthBridge API Server Library
//!
//! HTTP surface of the NorthBridge marketplace backend: accounts for admins,
//! shoppers and vendors, stores, products with image uploads, carts, orders
//! and a Paystack payment proxy.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and auth layers
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Policy guard and security headers
//! - `payment`: Payment gateway client
//! - `response`: Success envelope
//! - `routes`: API route handlers
//! - `session`: Access token cookies
//! - `storage`: Multipart parsing and upload storage
//! - `validation`: Request validation helpers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod payment;
pub mod response;
pub mod routes;
pub mod session;
pub mod storage;
pub mod validation;
