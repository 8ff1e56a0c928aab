//! Role binding enumeration API server library crate.
//!
//! # Purpose
//! Exposes the HTTP API surface, configuration, observability, and binding
//! source backends for use by the binary and tests.
pub mod api;
pub mod app;
pub mod config;
pub mod observability;
pub mod source;
