//! API server HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules plus content negotiation and error helpers.
pub mod codec;
pub mod enumerate;
pub mod error;
pub mod openapi;
pub mod system;
pub mod types;
